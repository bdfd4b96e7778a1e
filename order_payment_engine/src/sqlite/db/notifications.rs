use log::warn;
use sqlx::SqliteConnection;

/// Parks a confirmation notification that exhausted its retries. The row is the dead-letter
/// queue; an operator replays or discards it out of band.
pub async fn insert_dead_letter(
    order_id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO notification_dead_letters (order_id, reason) VALUES ($1, $2)")
        .bind(order_id)
        .bind(reason)
        .execute(conn)
        .await?;
    warn!("📮️ Notification for order id {order_id} moved to the dead-letter queue: {reason}");
    Ok(())
}

pub async fn count_dead_letters(order_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notification_dead_letters WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}
