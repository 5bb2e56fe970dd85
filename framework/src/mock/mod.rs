//! Mock objects: invocation recording, matching and behavior dispatch
//!
//! The mock layer has three moving parts:
//!
//! - a [`Scenario`]: the ordered, per-test log of every [`Invocation`],
//!   owned by a [`TestContext`] and shared by all of the test's mocks;
//! - an [`InvocationMatcher`]: a declarative expectation (method signature
//!   plus one [`matcher`](crate::mock::matchers) per parameter) used both to
//!   select behaviors and to verify calls;
//! - a [`MockCore`]: the per-mock behavior table and dispatcher behind every
//!   `#[mockable]`-generated mock.
//!
//! # Example
//!
//! ```rust,ignore
//! use attest::mock::{matchers::eq, TestContext};
//!
//! #[attest::mockable]
//! trait OrderRepository {
//!     fn by_id(&self, id: u64) -> Option<Order>;
//! }
//!
//! let context = TestContext::new();
//! let repository = MockOrderRepository::new(&context);
//! repository.when("by_id").with([eq(7u64)]).returns(Some(order));
//!
//! let service = OrderService::new(Arc::new(repository.clone()));
//! service.confirm(7)?;
//!
//! repository.verify("by_id").with([eq(7u64)]).invoked();
//! context.assert_no_more_invocations();
//! ```

pub mod behavior;
pub mod context;
pub mod core;
pub mod invocation;
pub mod matcher;
pub mod scenario;

pub use behavior::{BehaviorDefinition, DispatchOutcome, MockBehavior};
pub use context::TestContext;
pub use self::core::{BehaviorBuilder, MockCore, VerifyBuilder};
pub use invocation::{ArgValue, CallSite, Invocation, MethodDescriptor, MethodSignature};
pub use matcher::{ArgumentMatcher, InvocationMatcher};
pub use scenario::Scenario;

/// The argument matcher constructors, for a single import
///
/// ```rust,ignore
/// use attest::mock::matchers::{any, eq, len_eq, not_null};
/// ```
pub mod matchers {
    pub use super::matcher::{any, eq, is_null, len_eq, not_null, ref_eq, ref_eq_with, same, val};
}
