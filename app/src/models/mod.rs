pub mod orders;

pub use orders::{Customer, Order, OrderLine, OrderStatus};
