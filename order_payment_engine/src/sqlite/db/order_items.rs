use sqlx::SqliteConnection;

use crate::db_types::{CartEntry, OrderItem};

/// Inserts one snapshot line item per cart entry. Prices and names are frozen here; later
/// catalogue edits never flow back into these rows.
pub async fn insert_items(
    order_id: i64,
    entries: &[CartEntry],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let subtotal = entry.unit_price * entry.quantity;
        let item = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(entry.product_id)
        .bind(&entry.product_name)
        .bind(entry.unit_price)
        .bind(entry.quantity)
        .bind(subtotal)
        .fetch_one(&mut *conn)
        .await?;
        items.push(item);
    }
    Ok(items)
}

pub async fn fetch_items_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}
