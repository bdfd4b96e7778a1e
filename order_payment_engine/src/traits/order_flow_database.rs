use thiserror::Error;

use crate::{
    db_types::{NewOrderRequest, Order, OrderItem, OrderNumber, OrderStatus},
    reconciliation::{GatewayUpdate, StatusMapping},
    traits::{OrderManagement, TransitionOutcome},
};

/// The mutating half of the storage contract: order creation, token persistence and the guarded
/// reconciliation transition.
///
/// Implementations must make each method atomic. In particular:
/// * [`create_order_from_cart`](Self::create_order_from_cart) performs the stock check, the stock
///   decrement, the order/item inserts and the cart clear in one transaction, so a failure on any
///   line leaves no partial reservation behind.
/// * [`apply_transition`](Self::apply_transition) serialises the read–map–apply–compensate
///   sequence per order, so the stock restore and the paid flag are each claimed by exactly one of
///   any number of racing callers.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Creates an order from the customer's current cart in a single atomic transaction.
    ///
    /// Returns the persisted order and its snapshot items. Fails with [`OrderFlowError::EmptyCart`]
    /// when there is nothing to order, and [`OrderFlowError::InsufficientStock`] naming the first
    /// offending product when a requested quantity exceeds live stock.
    async fn create_order_from_cart(&self, req: NewOrderRequest) -> Result<(Order, Vec<OrderItem>), OrderFlowError>;

    /// Stores the gateway's opaque payment token and redirect URL against the order.
    async fn save_gateway_token(
        &self,
        order_number: &OrderNumber,
        token: &str,
        redirect_url: &str,
    ) -> Result<Order, OrderFlowError>;

    /// Applies a mapped gateway status to the order, compensating inventory when the order newly
    /// becomes cancelled.
    ///
    /// The write is guarded by an optimistic check against the state read at the start of the
    /// transaction; a caller that loses the race to a concurrent reconciler gets an unchanged
    /// [`TransitionOutcome`] instead of re-applying side effects.
    async fn apply_transition(
        &self,
        order_number: &OrderNumber,
        mapping: StatusMapping,
        update: &GatewayUpdate,
    ) -> Result<TransitionOutcome, OrderFlowError>;

    /// Cancels a customer's own pending order, restoring stock for every item.
    ///
    /// Fails with [`OrderFlowError::CancelNotAllowed`] when the order has left the `Pending`
    /// state. Shares the same guard as [`apply_transition`](Self::apply_transition), so a cancel
    /// racing a late webhook can never restore stock twice.
    async fn cancel_pending_order(
        &self,
        order_number: &OrderNumber,
        customer_id: i64,
    ) -> Result<TransitionOutcome, OrderFlowError>;

    /// Parks a permanently failed confirmation notification for operator follow-up.
    async fn record_notification_failure(&self, order_id: i64, reason: &str) -> Result<(), OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cannot place an order from an empty cart")]
    EmptyCart,
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock { product: String, requested: i64, available: i64 },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("The requested customer #{0} does not exist")]
    CustomerNotFound(i64),
    #[error("Only pending orders can be cancelled; this order is {0}")]
    CancelNotAllowed(OrderStatus),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
