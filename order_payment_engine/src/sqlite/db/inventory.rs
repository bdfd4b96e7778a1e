//! Stock and sold-counter adjustments.
//!
//! Reservation and restoration are exact inverses. Both take the full item list of one order and
//! must run inside the same transaction as the order mutation that triggered them, so the net
//! inventory effect of an order is always "fully reserved" or "fully reserved then fully
//! released" and never anything in between.

use log::debug;
use ops_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CartEntry, NewProduct, OrderItem, Product},
    traits::OrderFlowError,
};

/// Decrements stock and increments sold for every entry, guarding each row against underflow.
///
/// The `stock >= quantity` predicate re-checks availability at write time; an entry that fails it
/// raises [`OrderFlowError::InsufficientStock`], which aborts the enclosing transaction and rolls
/// back any decrements already applied for other entries.
pub async fn reserve_stock(entries: &[CartEntry], conn: &mut SqliteConnection) -> Result<(), OrderFlowError> {
    for entry in entries {
        let updated = sqlx::query(
            "UPDATE products SET stock = stock - $1, sold = sold + $1 WHERE id = $2 AND stock >= $1",
        )
        .bind(entry.quantity)
        .bind(entry.product_id)
        .execute(&mut *conn)
        .await?;
        if updated.rows_affected() == 0 {
            let available = fetch_product(entry.product_id, &mut *conn).await?.map(|p| p.stock).unwrap_or(0);
            return Err(OrderFlowError::InsufficientStock {
                product: entry.product_name.clone(),
                requested: entry.quantity,
                available,
            });
        }
    }
    debug!("📦️ Reserved stock for {} product(s)", entries.len());
    Ok(())
}

/// Restores stock and sold counters for every item of a cancelled order. The inverse of
/// [`reserve_stock`].
pub async fn restore_stock(items: &[OrderItem], conn: &mut SqliteConnection) -> Result<(), OrderFlowError> {
    for item in items {
        sqlx::query("UPDATE products SET stock = stock + $1, sold = sold - $1 WHERE id = $2")
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *conn)
            .await?;
    }
    debug!("📦️ Restored stock for {} product(s)", items.len());
    Ok(())
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_product(product: &NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product: Product =
        sqlx::query_as("INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING *")
            .bind(&product.name)
            .bind(product.price)
            .bind(product.stock)
            .fetch_one(conn)
            .await?;
    Ok(product)
}

pub async fn update_price(product_id: i64, price: Money, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET price = $1 WHERE id = $2").bind(price).bind(product_id).execute(conn).await?;
    Ok(())
}
