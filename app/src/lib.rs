//! Sample order-processing application
//!
//! A small domain used to exercise the attest framework end to end: the
//! services depend on mockable ports (repository, notifier, payment
//! gateway) and the integration tests under `tests/` drive them entirely
//! through generated mocks and lenient assertions.

pub mod models;
pub mod services;

pub use models::{Customer, Order, OrderLine, OrderStatus};
pub use services::{
    CheckoutService, MockNotifier, MockOrderRepository, MockPaymentGateway, Notifier,
    OrderRepository, OrderService, PaymentError, PaymentGateway, PaymentReceipt,
    RepositoryError, ServiceError,
};
