//! The explicit per-test context
//!
//! One [`TestContext`] is created at the start of a test and passed to every
//! mock constructor. It owns the test's [`Scenario`], so all mocks of the
//! test record into a single ordered log and the end-of-test checks
//! (`assert_no_more_invocations`) see every call. This explicit object
//! replaces the thread-local test state of framework-managed runners: the
//! test owns and threads its context instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use attest::mock::TestContext;
//!
//! let context = TestContext::new();
//! let repository = MockOrderRepository::new(&context);
//! let notifier = MockNotifier::new(&context);
//! // ... run the test ...
//! context.assert_no_more_invocations();
//! ```

use std::sync::{Arc, Mutex};

use crate::error::AttestError;

use super::scenario::Scenario;

/// Owns the scenario for one test execution
pub struct TestContext {
    scenario: Arc<Mutex<Scenario>>,
}

impl TestContext {
    /// Create a fresh context with an empty scenario
    pub fn new() -> Self {
        Self {
            scenario: Arc::new(Mutex::new(Scenario::new())),
        }
    }

    /// The shared scenario handle; mock constructors clone this
    pub fn scenario(&self) -> Arc<Mutex<Scenario>> {
        Arc::clone(&self.scenario)
    }

    /// Assert that every recorded invocation was consumed by an explicit
    /// verification; panics with the list of surprise calls otherwise
    #[track_caller]
    pub fn assert_no_more_invocations(&self) {
        if let Err(err) = self.verify_no_more_invocations() {
            panic!("{}", err);
        }
    }

    /// Non-panicking form of [`assert_no_more_invocations`](Self::assert_no_more_invocations)
    pub fn verify_no_more_invocations(&self) -> Result<(), AttestError> {
        self.scenario
            .lock()
            .expect("scenario lock poisoned")
            .verify_no_more_invocations()
    }

    /// The numbered report of every invocation observed so far
    pub fn observed_report(&self) -> String {
        self.scenario
            .lock()
            .expect("scenario lock poisoned")
            .observed_invocations_report()
    }

    /// Suggested verification statements for unconsumed invocations
    pub fn suggested_asserts_report(&self) -> String {
        self.scenario
            .lock()
            .expect("scenario lock poisoned")
            .suggested_asserts_report()
    }

    /// Clear the scenario, keeping the mocks usable
    pub fn reset(&self) {
        self.scenario
            .lock()
            .expect("scenario lock poisoned")
            .reset();
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
