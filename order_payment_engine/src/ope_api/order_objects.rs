use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem};

/// An order together with its snapshot line items, as returned to API callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderResult {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}
