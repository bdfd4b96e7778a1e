//! `SqliteDatabase` is the concrete storage backend for the order payment engine.
//!
//! It implements the [`traits`](crate::traits) contracts on top of a SQLite pool. All multi-step
//! flows run inside a single transaction; status transitions additionally carry the optimistic
//! guard from [`db::orders::transition_order`] so racing reconcilers cannot double-apply side
//! effects.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use ops_common::Money;
use sqlx::SqlitePool;

use super::db::{carts, customers, inventory, notifications, order_items, orders, orders::PaidAtChange, new_pool};
use crate::{
    db_types::{
        Customer,
        NewCustomer,
        NewOrderRequest,
        NewProduct,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatus,
        PaymentStatus,
        Product,
    },
    helpers::generate_order_number,
    reconciliation::{GatewayUpdate, StatusMapping},
    traits::{OrderFlowDatabase, OrderFlowError, OrderManagement, TransitionOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool with `max_connections` connections.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, OrderFlowError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    //------------------------------ Collaborator interfaces (catalogue, cart, users) -----------------------------
    // These back the storefront surfaces that sit outside this service. They exist here so that
    // the engine's own flows (and its tests) can exercise the store end to end.

    pub async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::insert_customer(&customer, &mut conn).await?;
        Ok(customer)
    }

    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let product = inventory::insert_product(&product, &mut conn).await?;
        Ok(product)
    }

    pub async fn update_product_price(&self, product_id: i64, price: Money) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        inventory::update_price(product_id, price, &mut conn).await?;
        Ok(())
    }

    pub async fn add_to_cart(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        carts::upsert_cart_line(customer_id, product_id, quantity, &mut conn).await?;
        Ok(())
    }

    pub async fn count_notification_dead_letters(&self, order_id: i64) -> Result<i64, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let count = notifications::count_dead_letters(order_id, &mut conn).await?;
        Ok(count)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let items = order_items::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_customer(customer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(customer_id, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let product = inventory::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order_from_cart(&self, req: NewOrderRequest) -> Result<(Order, Vec<OrderItem>), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let entries = carts::fetch_cart_entries(req.customer_id, &mut tx).await?;
        if entries.is_empty() {
            return Err(OrderFlowError::EmptyCart);
        }
        // Early validation against the stock read in this transaction. The conditional decrement
        // in reserve_stock re-asserts the same invariant at write time.
        for entry in &entries {
            if entry.quantity > entry.stock {
                return Err(OrderFlowError::InsufficientStock {
                    product: entry.product_name.clone(),
                    requested: entry.quantity,
                    available: entry.stock,
                });
            }
        }
        let items_total: Money = entries.iter().map(|e| e.unit_price * e.quantity).sum();
        let total_amount = items_total + req.shipping_fee;
        let order_number = generate_order_number();
        let order = orders::insert_order(&order_number, &req, total_amount, &mut tx).await?;
        let items = order_items::insert_items(order.id, &entries, &mut tx).await?;
        inventory::reserve_stock(&entries, &mut tx).await?;
        let cleared = carts::clear_cart(req.customer_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {order_number} created for customer #{}: {} item(s), total {total_amount}, {cleared} cart \
             line(s) cleared",
            req.customer_id,
            items.len()
        );
        Ok((order, items))
    }

    async fn save_gateway_token(
        &self,
        order_number: &OrderNumber,
        token: &str,
        redirect_url: &str,
    ) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_gateway_token(order_number, token, redirect_url, &mut conn)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        debug!("🗃️ Gateway token stored for order {order_number}");
        Ok(order)
    }

    async fn apply_transition(
        &self,
        order_number: &OrderNumber,
        mapping: StatusMapping,
        update: &GatewayUpdate,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(order_number, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        let target_status = mapping.order_status.unwrap_or(order.status);
        let target_payment = mapping.payment_status;
        if order.status == target_status && order.payment_status == target_payment {
            trace!("🗃️ Order {order_number} already at {target_status}/{target_payment}; nothing to apply");
            return Ok(TransitionOutcome::unchanged(order));
        }
        let became_paid = target_payment == PaymentStatus::Paid && order.payment_status != PaymentStatus::Paid;
        let newly_cancelled = target_status == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled;
        let paid_at = if became_paid {
            PaidAtChange::Set(update.event_time.unwrap_or_else(Utc::now))
        } else if matches!(target_payment, PaymentStatus::Cancelled | PaymentStatus::Refund) {
            PaidAtChange::Clear
        } else {
            PaidAtChange::Keep
        };
        let updated = orders::transition_order(
            &order,
            target_status,
            target_payment,
            update.transaction_id.as_deref(),
            update.payment_type.as_deref(),
            paid_at,
            &mut tx,
        )
        .await?;
        let updated = match updated {
            Some(order) => order,
            None => {
                // A concurrent reconciler moved the order between our read and our write. Its
                // transaction owns the side effects; report the state it left behind.
                drop(tx);
                let mut conn = self.pool.acquire().await?;
                let current = orders::fetch_order_by_number(order_number, &mut conn)
                    .await?
                    .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
                info!("🗃️ Order {order_number} was reconciled concurrently; this update is a no-op");
                return Ok(TransitionOutcome::unchanged(current));
            },
        };
        if newly_cancelled {
            let items = order_items::fetch_items_for_order(order.id, &mut tx).await?;
            inventory::restore_stock(&items, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {order_number} moved to {target_status}/{target_payment}");
        Ok(TransitionOutcome { order: updated, changed: true, became_paid, inventory_restored: newly_cancelled })
    }

    async fn cancel_pending_order(
        &self,
        order_number: &OrderNumber,
        customer_id: i64,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(order_number, &mut tx)
            .await?
            // Another customer's order is reported as absent rather than forbidden.
            .filter(|o| o.customer_id == customer_id)
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        if order.status != OrderStatus::Pending {
            return Err(OrderFlowError::CancelNotAllowed(order.status));
        }
        let updated = orders::transition_order(
            &order,
            OrderStatus::Cancelled,
            PaymentStatus::Cancelled,
            None,
            None,
            PaidAtChange::Clear,
            &mut tx,
        )
        .await?;
        let updated = match updated {
            Some(order) => order,
            None => {
                drop(tx);
                let mut conn = self.pool.acquire().await?;
                let current = orders::fetch_order_by_number(order_number, &mut conn)
                    .await?
                    .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
                // A late gateway notification got there first. If it cancelled the order, the
                // customer's request is already satisfied and the stock is already restored.
                return if current.status == OrderStatus::Cancelled {
                    info!("🗃️ Order {order_number} was already cancelled by a concurrent notification");
                    Ok(TransitionOutcome::unchanged(current))
                } else {
                    Err(OrderFlowError::CancelNotAllowed(current.status))
                };
            },
        };
        let items = order_items::fetch_items_for_order(order.id, &mut tx).await?;
        inventory::restore_stock(&items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_number} cancelled by customer #{customer_id}; stock restored");
        Ok(TransitionOutcome { order: updated, changed: true, became_paid: false, inventory_restored: true })
    }

    async fn record_notification_failure(&self, order_id: i64, reason: &str) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert_dead_letter(order_id, reason, &mut conn).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}
