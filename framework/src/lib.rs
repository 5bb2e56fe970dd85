//! attest: mock objects and lenient structural assertions for Rust tests
//!
//! The framework has two cores:
//!
//! - a **mock layer** ([`mock`]): traits annotated with
//!   [`#[mockable]`](mockable) get a generated mock implementation whose
//!   calls are recorded into a per-test [`Scenario`](mock::Scenario),
//!   matched against declared expectations and dispatched to defined
//!   behaviors (`returns`, `raises`, `performs`);
//! - a **comparison engine** ([`compare`]): a recursive structural
//!   comparator over serde-reflected value trees, with configurable
//!   leniency (element order, expected-side defaults, timestamp values),
//!   producing a difference tree that formats into readable failure
//!   reports. The [`assert`] module is its fluent facade.
//!
//! # Example
//!
//! ```rust,ignore
//! use attest::{assert_lenient_eq, mockable};
//! use attest::mock::{matchers::eq, TestContext};
//!
//! #[mockable]
//! trait OrderRepository {
//!     fn by_id(&self, id: u64) -> Option<Order>;
//! }
//!
//! #[test]
//! fn confirms_an_order() {
//!     let context = TestContext::new();
//!     let repository = MockOrderRepository::new(&context);
//!     repository.when("by_id").with([eq(7u64)]).returns(Some(order()));
//!
//!     let confirmed = OrderService::new(Arc::new(repository.clone())).confirm(7).unwrap();
//!
//!     assert_lenient_eq(&order(), &confirmed);
//!     repository.verify("by_id").with([eq(7u64)]).invoked();
//!     context.assert_no_more_invocations();
//! }
//! ```

pub mod assert;
pub mod compare;
pub mod config;
pub mod error;
pub mod mock;

pub use assert::{
    assert_lenient_eq, assert_property_lenient_eq, assert_reflect_eq, lenient_eq, reflect_eq,
};
pub use compare::{CompareMode, Difference, ReflectValue};
pub use config::AttestConfig;
pub use error::AttestError;
pub use mock::{Scenario, TestContext};

pub use attest_macros::mockable;

// Re-exported for the code `#[mockable]` generates and for async mock users.
pub use async_trait;
pub use serde_json;
