//! Application services and the ports they depend on
//!
//! The repository, notifier and payment-gateway traits are annotated with
//! `#[mockable]`, so the test suite gets `MockOrderRepository`,
//! `MockNotifier` and `MockPaymentGateway` implementations for free.

pub mod checkout_service;
pub mod order_service;

use attest::mockable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Order;

/// Storage port for orders
#[mockable]
pub trait OrderRepository: Send + Sync {
    fn by_id(&self, id: u64) -> Option<Order>;
    fn save(&self, order: &Order) -> Result<(), RepositoryError>;
    fn pending(&self) -> Vec<Order>;
}

/// Outbound notification port
#[mockable]
pub trait Notifier: Send + Sync {
    fn order_confirmed(&self, order: &Order);
    fn order_cancelled(&self, order_id: u64, reason: String);
}

/// Payment port; charged asynchronously against an external provider
#[mockable]
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        order_id: u64,
        amount_cents: i64,
    ) -> Result<PaymentReceipt, PaymentError>;
}

/// Receipt returned by a successful charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub reference: String,
    pub amount_cents: i64,
}

/// Errors raised by the storage port
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RepositoryError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("order {0} conflicts with a newer stored version")]
    Conflict(u64),
}

/// Errors raised by the payment port
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PaymentError {
    #[error("card declined")]
    Declined,
    #[error("payment provider timed out")]
    Timeout,
}

/// Errors surfaced to service callers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("order {id} does not exist")]
    UnknownOrder { id: u64 },
    #[error("order {id} cannot be processed in its current state")]
    InvalidState { id: u64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

pub use checkout_service::CheckoutService;
pub use order_service::OrderService;
