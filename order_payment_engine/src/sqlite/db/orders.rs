use chrono::{DateTime, Utc};
use log::{debug, trace};
use ops_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrderRequest, Order, OrderNumber, OrderStatus, PaymentStatus},
    traits::OrderFlowError,
};

/// How a status transition should treat the `paid_at` column.
///
/// `Keep` is the default: a later non-paid event (e.g. a partial refund) must not erase the
/// record of when the order was paid. Only a definitive reversal clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidAtChange {
    Set(DateTime<Utc>),
    Clear,
    Keep,
}

/// Inserts a new order row. This is not atomic on its own; embed it in the order-creation
/// transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    order_number: &OrderNumber,
    req: &NewOrderRequest,
    total_amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                total_amount,
                shipping_fee,
                recipient,
                phone,
                address,
                city,
                postal_code,
                payment_method
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(req.customer_id)
    .bind(total_amount)
    .bind(req.shipping_fee)
    .bind(&req.shipping.recipient)
    .bind(&req.shipping.phone)
    .bind(&req.shipping.address)
    .bind(&req.shipping.city)
    .bind(&req.shipping.postal_code)
    .bind(&req.payment_method)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {order_number} inserted");
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at ASC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Stores the gateway token and redirect URL on the order. Returns `None` when the order does not
/// exist.
pub async fn update_gateway_token(
    order_number: &OrderNumber,
    token: &str,
    redirect_url: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET gateway_token = $1, redirect_url = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE order_number = $3 RETURNING *",
    )
    .bind(token)
    .bind(redirect_url)
    .bind(order_number.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Applies a status transition with an optimistic guard against the state the caller read.
///
/// The `WHERE` clause pins both status columns to their prior values, so of any number of
/// concurrent reconcilers exactly one sees a row come back; the rest get `None` and must treat
/// the transition (and its side effects) as already handled.
pub async fn transition_order(
    prior: &Order,
    new_status: OrderStatus,
    new_payment_status: PaymentStatus,
    transaction_id: Option<&str>,
    payment_type: Option<&str>,
    paid_at: PaidAtChange,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderFlowError> {
    let (paid_at_marker, paid_at_value) = match paid_at {
        PaidAtChange::Set(at) => ("set", Some(at)),
        PaidAtChange::Clear => ("clear", None),
        PaidAtChange::Keep => ("keep", None),
    };
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                payment_status = $2,
                transaction_id = COALESCE($3, transaction_id),
                payment_type = COALESCE($4, payment_type),
                paid_at = CASE $5 WHEN 'set' THEN $6 WHEN 'clear' THEN NULL ELSE paid_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $7 AND status = $8 AND payment_status = $9
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(new_payment_status)
    .bind(transaction_id)
    .bind(payment_type)
    .bind(paid_at_marker)
    .bind(paid_at_value)
    .bind(prior.id)
    .bind(prior.status)
    .bind(prior.payment_status)
    .fetch_optional(conn)
    .await?;
    trace!(
        "📝️ Transition of order {} to {new_status}/{new_payment_status}: {}",
        prior.order_number,
        if result.is_some() { "applied" } else { "lost the race" }
    );
    Ok(result)
}
