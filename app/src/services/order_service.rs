//! Synchronous order workflows

use std::sync::Arc;

use crate::models::{Order, OrderStatus};

use super::{Notifier, OrderRepository, ServiceError};

/// Confirms and cancels orders against the storage port, notifying on
/// success
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Confirm a pending order: persist the state change and notify
    pub fn confirm_order(&self, id: u64) -> Result<Order, ServiceError> {
        let mut order = self
            .repository
            .by_id(id)
            .ok_or(ServiceError::UnknownOrder { id })?;
        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidState { id });
        }
        order.status = OrderStatus::Confirmed;
        self.repository.save(&order)?;
        self.notifier.order_confirmed(&order);
        Ok(order)
    }

    /// Cancel an order that has not been paid yet
    pub fn cancel_order(&self, id: u64, reason: &str) -> Result<Order, ServiceError> {
        let mut order = self
            .repository
            .by_id(id)
            .ok_or(ServiceError::UnknownOrder { id })?;
        if order.status == OrderStatus::Paid {
            return Err(ServiceError::InvalidState { id });
        }
        order.status = OrderStatus::Cancelled;
        self.repository.save(&order)?;
        self.notifier.order_cancelled(id, reason.to_string());
        Ok(order)
    }

    /// The total value of all pending orders, in cents
    pub fn pending_total_cents(&self) -> i64 {
        self.repository
            .pending()
            .iter()
            .map(Order::total_cents)
            .sum()
    }
}
