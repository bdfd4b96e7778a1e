use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::CartEntry;

/// Reads the customer's cart joined against the live catalogue. Called inside the order-creation
/// transaction so the stock figure each entry carries is the one the decrement will act on.
pub async fn fetch_cart_entries(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<CartEntry>, sqlx::Error> {
    let entries = sqlx::query_as(
        r#"
            SELECT
                cart_items.product_id AS product_id,
                products.name         AS product_name,
                products.price        AS unit_price,
                cart_items.quantity   AS quantity,
                products.stock        AS stock
            FROM cart_items JOIN products ON cart_items.product_id = products.id
            WHERE cart_items.customer_id = $1
            ORDER BY cart_items.id ASC;
        "#,
    )
    .bind(customer_id)
    .fetch_all(conn)
    .await?;
    trace!("🛒️ Fetched {} cart line(s) for customer #{customer_id}", entries.len());
    Ok(entries)
}

pub async fn clear_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM cart_items WHERE customer_id = $1").bind(customer_id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Adds a product to the cart, accumulating the quantity when the line already exists.
pub async fn upsert_cart_line(
    customer_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (customer_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity;
        "#,
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}
