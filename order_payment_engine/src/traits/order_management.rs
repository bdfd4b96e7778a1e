use crate::{
    db_types::{Customer, Order, OrderItem, OrderNumber, Product},
    traits::OrderFlowError,
};

/// Read-only access to orders and their collaborators.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Returns the order with the given external order number, if it exists.
    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderFlowError>;

    /// Returns the snapshot line items belonging to the order with internal id `order_id`.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError>;

    /// Returns all orders placed by the given customer, oldest first.
    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderFlowError>;

    /// Looks up a customer's contact record (consumed when building gateway customer fields and
    /// confirmation notifications).
    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, OrderFlowError>;

    /// Reads a product's current catalogue record, including its stock and sold counters.
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, OrderFlowError>;
}
