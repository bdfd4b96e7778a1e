use serde::{Deserialize, Serialize};

use crate::db_types::{Customer, Order};

/// Emitted exactly once per real transition of an order into the paid state. Carries the owning
/// customer so subscribers can address the confirmation without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub customer: Customer,
}

impl OrderPaidEvent {
    pub fn new(order: Order, customer: Customer) -> Self {
        Self { order, customer }
    }
}
