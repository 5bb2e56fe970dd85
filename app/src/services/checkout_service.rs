//! Asynchronous checkout workflow

use std::sync::Arc;

use crate::models::{Order, OrderStatus};

use super::{Notifier, OrderRepository, PaymentGateway, PaymentReceipt, ServiceError};

/// Charges an order through the payment port and persists the result
pub struct CheckoutService {
    repository: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl CheckoutService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            gateway,
            notifier,
        }
    }

    /// Charge a confirmed order and mark it paid
    pub async fn checkout(&self, id: u64) -> Result<PaymentReceipt, ServiceError> {
        let mut order: Order = self
            .repository
            .by_id(id)
            .ok_or(ServiceError::UnknownOrder { id })?;
        if order.status != OrderStatus::Confirmed {
            return Err(ServiceError::InvalidState { id });
        }
        let receipt = self.gateway.charge(id, order.total_cents()).await?;
        order.status = OrderStatus::Paid;
        self.repository.save(&order)?;
        self.notifier.order_confirmed(&order);
        Ok(receipt)
    }
}
