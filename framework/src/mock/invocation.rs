//! Invocation records
//!
//! An [`Invocation`] is the immutable record of one intercepted mock call:
//! which mock, which method, the reflected argument values and the call
//! site. Mock implementations generated by `#[mockable]` build one per call
//! and hand it to the dispatch core; from there it is owned by the
//! [`Scenario`](super::Scenario) that recorded it.

use std::fmt;
use std::panic::Location;

use serde::Serialize;

use crate::compare::{format_value, ReflectValue};
use crate::config::AttestConfig;

/// Compile-time description of one mockable trait method
///
/// The `#[mockable]` macro emits a table of these so the dispatch core can
/// validate method names and arities at behavior-definition time.
#[derive(Debug, Clone, Copy)]
pub struct MethodDescriptor {
    /// The method name
    pub name: &'static str,
    /// The parameter types, as written in the trait
    pub param_types: &'static [&'static str],
}

/// A method signature: trait, method and ordered parameter types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSignature {
    /// The trait declaring the method
    pub trait_name: &'static str,
    /// The method name
    pub method: &'static str,
    /// The parameter types, as written in the trait
    pub param_types: &'static [&'static str],
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.trait_name,
            self.method,
            self.param_types.join(", ")
        )
    }
}

/// The source location a call or assertion originated from
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    file: &'static str,
    line: u32,
}

impl CallSite {
    /// Create a call site from an explicit location (used by generated code)
    pub fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Capture the caller's location
    #[track_caller]
    pub fn capture() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One recorded argument: the reflected value plus, for reference
/// parameters, the address the reference pointed at.
///
/// The address is what the `same()` matcher compares; by-value parameters
/// carry no address and never match `same()`.
#[derive(Debug, Clone)]
pub struct ArgValue {
    value: ReflectValue,
    source_ptr: Option<usize>,
}

impl ArgValue {
    /// Record a by-value argument
    pub fn of<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        Self {
            value: reflect_argument(value),
            source_ptr: None,
        }
    }

    /// Record a by-reference argument, keeping the referenced address for
    /// identity matching
    pub fn of_ref<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        Self {
            value: reflect_argument(value),
            source_ptr: Some(value as *const T as *const () as usize),
        }
    }

    /// The reflected argument value
    pub fn value(&self) -> &ReflectValue {
        &self.value
    }

    /// The referenced address, if the argument was passed by reference
    pub fn source_ptr(&self) -> Option<usize> {
        self.source_ptr
    }
}

fn reflect_argument<T>(value: &T) -> ReflectValue
where
    T: Serialize + ?Sized,
{
    match ReflectValue::from_serialize(value, AttestConfig::current().max_depth) {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    }
}

/// The immutable record of one intercepted mock call
#[derive(Debug, Clone)]
pub struct Invocation {
    mock_name: String,
    signature: MethodSignature,
    arguments: Vec<ArgValue>,
    invoked_at: CallSite,
}

impl Invocation {
    pub fn new(
        mock_name: impl Into<String>,
        signature: MethodSignature,
        arguments: Vec<ArgValue>,
        invoked_at: CallSite,
    ) -> Self {
        Self {
            mock_name: mock_name.into(),
            signature,
            arguments,
            invoked_at,
        }
    }

    /// The name of the mock the call was made on (the receiver identity)
    pub fn mock_name(&self) -> &str {
        &self.mock_name
    }

    /// The invoked method's signature
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// The recorded arguments, in call order
    pub fn arguments(&self) -> &[ArgValue] {
        &self.arguments
    }

    /// The reflected value of the argument at `index`
    pub fn argument(&self, index: usize) -> Option<&ReflectValue> {
        self.arguments.get(index).map(ArgValue::value)
    }

    /// Where the call was made
    pub fn invoked_at(&self) -> CallSite {
        self.invoked_at
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arguments: Vec<String> = self
            .arguments
            .iter()
            .map(|argument| format_value(argument.value()))
            .collect();
        write!(
            f,
            "{}.{}({})",
            self.mock_name,
            self.signature.method,
            arguments.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNATURE: MethodSignature = MethodSignature {
        trait_name: "Repository",
        method: "find",
        param_types: &["u64"],
    };

    #[test]
    fn displays_as_a_call_expression() {
        let invocation = Invocation::new(
            "repository_mock",
            SIGNATURE,
            vec![ArgValue::of(&7u64)],
            CallSite::new("tests.rs", 1),
        );
        assert_eq!(invocation.to_string(), "repository_mock.find(7)");
    }

    #[test]
    fn reference_arguments_carry_their_address() {
        let value = "hello".to_string();
        let by_ref = ArgValue::of_ref(&value);
        let by_val = ArgValue::of(&value);
        assert!(by_ref.source_ptr().is_some());
        assert!(by_val.source_ptr().is_none());
    }

    #[test]
    fn signatures_render_with_parameter_types() {
        assert_eq!(SIGNATURE.to_string(), "Repository.find(u64)");
    }
}
