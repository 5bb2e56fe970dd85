//! Shared fixtures for the integration tests
#![allow(dead_code)]

use app::{Customer, Order, OrderLine, OrderStatus};
use chrono::{TimeZone, Utc};

pub fn customer() -> Customer {
    Customer {
        id: 11,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    }
}

pub fn lines() -> Vec<OrderLine> {
    vec![
        OrderLine {
            sku: "A-1".to_string(),
            quantity: 2,
            unit_price_cents: 1200,
        },
        OrderLine {
            sku: "B-7".to_string(),
            quantity: 1,
            unit_price_cents: 2000,
        },
    ]
}

pub fn pending_order(id: u64) -> Order {
    Order {
        id,
        customer: customer(),
        lines: lines(),
        status: OrderStatus::Pending,
        placed_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        note: None,
    }
}

pub fn confirmed_order(id: u64) -> Order {
    Order {
        status: OrderStatus::Confirmed,
        ..pending_order(id)
    }
}
