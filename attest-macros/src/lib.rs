//! Procedural macros for the attest testing framework
//!
//! This crate provides the `#[mockable]` attribute macro that generates an
//! explicit mock implementation for a trait. The generated mock records
//! every call into the test's scenario and dispatches it against the
//! behaviors defined with `when(..)`.
//!
//! Use through the `attest` crate, which re-exports the macro.

use proc_macro::TokenStream;

mod mockable;
mod utils;

/// Generate a mock implementation (`MockFoo`) for a trait (`Foo`)
///
/// # Example
///
/// ```rust,ignore
/// use attest::mockable;
/// use attest::mock::{matchers::eq, TestContext};
///
/// #[mockable]
/// pub trait OrderRepository {
///     fn by_id(&self, id: u64) -> Option<Order>;
/// }
///
/// let context = TestContext::new();
/// let repository = MockOrderRepository::new(&context);
/// repository.when("by_id").with([eq(7u64)]).returns(Some(order));
/// assert_eq!(repository.by_id(7), Some(order));
/// repository.verify("by_id").invoked();
/// ```
///
/// Method parameters must implement `serde::Serialize` and return types
/// `serde::Deserialize`. Traits with `async fn` methods are supported when
/// `#[mockable]` is placed above `#[async_trait]`.
#[proc_macro_attribute]
pub fn mockable(attr: TokenStream, input: TokenStream) -> TokenStream {
    mockable::mockable_impl(attr, input)
}
