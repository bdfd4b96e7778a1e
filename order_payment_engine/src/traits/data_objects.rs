use crate::db_types::Order;

/// The result of pushing an order through the guarded status transition.
///
/// The flags record which side effects this particular call performed. Under concurrent
/// reconciliation only one caller observes `became_paid` or `inventory_restored` for a given
/// real-world transition; every other caller receives `changed == false`.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub order: Order,
    /// False when the observed state already matched, or a concurrent writer applied it first.
    pub changed: bool,
    /// True only for the call that moved `payment_status` into `Paid`.
    pub became_paid: bool,
    /// True only for the call that moved the order into `Cancelled` and restored its stock.
    pub inventory_restored: bool,
}

impl TransitionOutcome {
    pub fn unchanged(order: Order) -> Self {
        Self { order, changed: false, became_paid: false, inventory_restored: false }
    }
}
