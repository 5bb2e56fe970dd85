//! Framework-wide error types
//!
//! Provides a unified error type used throughout the framework. Verification
//! failures are ordinary error values here; the fluent mock/assert surface is
//! what turns them into test panics.

use thiserror::Error;

/// Framework-wide error type
///
/// This enum represents all possible errors that can occur in the framework.
/// Functions that build comparisons or verify scenarios return it so callers
/// can propagate with the `?` operator; the panicking assert entry points
/// (`assert_lenient_eq`, the `verify(..)` builder) unwrap it with a full
/// diagnostic message.
///
/// # Example
///
/// ```rust,ignore
/// use attest::{AttestError, mock::Scenario};
///
/// fn check(scenario: &mut Scenario) -> Result<(), AttestError> {
///     scenario.verify_no_more_invocations()?; // propagates AttestError
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum AttestError {
    /// A mock was asked about a method its trait does not declare
    #[error("Mock '{mock}' has no method named '{method}'. Available methods: {available}")]
    UnknownMethod {
        /// The mock's name
        mock: String,
        /// The requested method name
        method: String,
        /// Comma-separated list of declared method names
        available: String,
    },

    /// The number of argument matchers does not equal the method's arity
    #[error("Method '{method}' takes {arity} argument(s), but {matchers} matcher(s) were given")]
    MatcherCount {
        /// The method the matchers were declared for
        method: String,
        /// The method's declared parameter count
        arity: usize,
        /// The number of matchers that were given
        matchers: usize,
    },

    /// A scenario verification failed
    ///
    /// The message carries the full diagnostic: expected signature, similar
    /// observed invocations and the observed-invocations report.
    #[error("{message}")]
    Verification {
        /// The complete, preformatted failure message
        message: String,
    },

    /// A value could not be reflected into the comparison model
    #[error("Could not reflect value into the comparison model: {reason}")]
    Reflection {
        /// The underlying serialization failure
        reason: String,
    },

    /// Reflection or comparison recursed past the configured depth bound
    ///
    /// This guards against self-referential object graphs and indicates a
    /// misconfigured comparison rather than a genuine data mismatch.
    #[error("Maximum reflection depth of {max_depth} exceeded; the compared graph is too deep or self-referential")]
    DepthExceeded {
        /// The configured depth bound
        max_depth: usize,
    },

    /// A property path given to a property assert could not be navigated
    #[error("Invalid property path '{path}': {reason}")]
    PropertyPath {
        /// The full property path as given
        path: String,
        /// Why navigation failed
        reason: String,
    },

    /// A behavior value does not fit the mocked method's return type
    #[error("Mock '{mock}': behavior value for method '{method}' does not fit the return type: {reason}")]
    ReturnValue {
        /// The mock's name
        mock: String,
        /// The method the behavior was defined for
        method: String,
        /// The underlying deserialization failure
        reason: String,
    },
}

impl AttestError {
    /// Create a Verification error with a preformatted message
    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification {
            message: message.into(),
        }
    }

    /// Create a Reflection error
    pub fn reflection(reason: impl Into<String>) -> Self {
        Self::Reflection {
            reason: reason.into(),
        }
    }

    /// Create a PropertyPath error
    pub fn property_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PropertyPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownMethod error listing the declared methods
    pub fn unknown_method(
        mock: impl Into<String>,
        method: impl Into<String>,
        declared: &[&str],
    ) -> Self {
        Self::UnknownMethod {
            mock: mock.into(),
            method: method.into(),
            available: declared.join(", "),
        }
    }
}
