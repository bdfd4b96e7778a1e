//! The confirmation-notification worker.
//!
//! Reconciliation publishes an `OrderPaidEvent` exactly once per real transition into the paid
//! state; this module turns that event into an outbound delivery with retry and exponential
//! backoff, parking terminal failures in the dead-letter table. The worker runs on the engine's
//! event channel, so a slow mail service can never hold up a webhook acknowledgement.

use std::{future::Future, pin::Pin, sync::Arc};

use futures::future::BoxFuture;
use log::*;
use order_payment_engine::{
    events::{Handler, OrderPaidEvent},
    db_types::{Customer, Order},
    OrderFlowDatabase,
    SqliteDatabase,
};
use thiserror::Error;

use crate::config::NotificationConfig;

#[derive(Debug, Clone, Error)]
#[error("Could not deliver the confirmation: {0}")]
pub struct NotificationError(pub String);

/// Sends a payment-confirmation message for an order to its owning customer.
///
/// The production implementation fronts the storefront's mail service; tests substitute
/// implementations that count or fail deliveries.
pub trait NotificationDispatcher: Send + Sync {
    fn send<'a>(&'a self, order: &'a Order, customer: &'a Customer) -> BoxFuture<'a, Result<(), NotificationError>>;
}

/// Dispatcher used until a mail collaborator is wired in: records the confirmation in the log and
/// reports success.
#[derive(Debug, Clone, Default)]
pub struct LoggingDispatcher;

impl NotificationDispatcher for LoggingDispatcher {
    fn send<'a>(&'a self, order: &'a Order, customer: &'a Customer) -> BoxFuture<'a, Result<(), NotificationError>> {
        Box::pin(async move {
            info!(
                "📧️ Payment confirmed for order {}: {} to {} <{}>",
                order.order_number, order.total_amount, customer.name, customer.email
            );
            Ok(())
        })
    }
}

/// Builds the order-paid hook: deliver, retry with doubling backoff, dead-letter on exhaustion.
/// Failures never propagate anywhere except the log and the dead-letter table; the state
/// transition that triggered the event is already committed and must stand.
pub fn paid_notification_hook<D>(
    dispatcher: Arc<D>,
    db: SqliteDatabase,
    config: NotificationConfig,
) -> Handler<OrderPaidEvent>
where
    D: NotificationDispatcher + 'static,
{
    Arc::new(move |event: OrderPaidEvent| {
        let dispatcher = Arc::clone(&dispatcher);
        let db = db.clone();
        let config = config.clone();
        Box::pin(async move {
            let order_number = event.order.order_number.clone();
            let mut backoff = config.initial_backoff;
            for attempt in 1..=config.max_attempts {
                match dispatcher.send(&event.order, &event.customer).await {
                    Ok(()) => {
                        debug!("📧️ Confirmation for order {order_number} delivered on attempt {attempt}");
                        return;
                    },
                    Err(e) => {
                        warn!(
                            "📧️ Confirmation for order {order_number} failed on attempt {attempt}/{}: {e}",
                            config.max_attempts
                        );
                        if attempt < config.max_attempts {
                            tokio::time::sleep(backoff).await;
                            backoff *= 2;
                        } else if let Err(db_err) =
                            db.record_notification_failure(event.order.id, &e.to_string()).await
                        {
                            error!("📧️ Could not dead-letter the confirmation for order {order_number}: {db_err}");
                        }
                    },
                }
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    })
}
