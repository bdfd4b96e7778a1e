use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrderRequest, Order, OrderNumber},
    events::{EventProducers, OrderPaidEvent},
    ope_api::OrderResult,
    reconciliation::{map_status, GatewayUpdate},
    traits::{OrderFlowDatabase, OrderFlowError, TransitionOutcome},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: creation with inventory
/// reservation, payment-session persistence, cancellation, and — most importantly — the single
/// reconciliation routine that both the webhook ingress and the status poll feed into.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Places a new order from the customer's current cart.
    ///
    /// The order, its item snapshots, the stock reservation and the cart clear are one atomic
    /// transaction: an empty cart or an out-of-stock line aborts the whole placement with no
    /// partial effect visible.
    pub async fn place_order(&self, req: NewOrderRequest) -> Result<OrderResult, OrderFlowError> {
        let customer_id = req.customer_id;
        self.db
            .fetch_customer(customer_id)
            .await?
            .ok_or(OrderFlowError::CustomerNotFound(customer_id))?;
        let (order, items) = self.db.create_order_from_cart(req).await?;
        info!(
            "🔄️📦️ Order {} placed by customer #{customer_id}: {} item(s), total {}",
            order.order_number,
            items.len(),
            order.total_amount
        );
        Ok(OrderResult::new(order, items))
    }

    /// Fetches an order and its items by order number.
    pub async fn order_with_items(&self, order_number: &OrderNumber) -> Result<Option<OrderResult>, OrderFlowError> {
        let Some(order) = self.db.fetch_order_by_number(order_number).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(Some(OrderResult::new(order, items)))
    }

    /// Stores the gateway's payment token and redirect URL against the order.
    pub async fn attach_payment_session(
        &self,
        order_number: &OrderNumber,
        token: &str,
        redirect_url: &str,
    ) -> Result<Order, OrderFlowError> {
        self.db.save_gateway_token(order_number, token, redirect_url).await
    }

    /// The shared reconciliation routine. Every observation of the remote transaction — whether
    /// pushed by the gateway's webhook or pulled by a status query — is applied through this
    /// method and nowhere else.
    ///
    /// An unrecognised status combination is logged and leaves the order untouched. A recognised
    /// one is applied under the backend's optimistic guard; when this call is the one that moved
    /// the order into the paid state, the confirmation notification event is published exactly
    /// once, fire-and-forget.
    pub async fn apply_gateway_update(
        &self,
        order_number: &OrderNumber,
        update: GatewayUpdate,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        let Some(mapping) = map_status(update.transaction_status, update.fraud_status) else {
            warn!(
                "🔁️ No mapping for gateway status '{}' (fraud: {:?}) on order {order_number}; leaving local state \
                 untouched",
                update.transaction_status, update.fraud_status
            );
            let order = self
                .db
                .fetch_order_by_number(order_number)
                .await?
                .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
            return Ok(TransitionOutcome::unchanged(order));
        };
        let outcome = self.db.apply_transition(order_number, mapping, &update).await?;
        if outcome.inventory_restored {
            info!("🔁️ Order {order_number} cancelled by gateway status '{}'; stock restored", update.transaction_status);
        }
        if outcome.became_paid {
            info!("🔁️ Order {order_number} is now paid (gateway status '{}')", update.transaction_status);
            self.publish_order_paid(&outcome.order).await;
        }
        Ok(outcome)
    }

    /// Cancels a customer's own pending order: local transition plus stock restore, sharing the
    /// reconciliation guard so a racing gateway notification cannot double-restore.
    pub async fn cancel_order(
        &self,
        order_number: &OrderNumber,
        customer_id: i64,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        let outcome = self.db.cancel_pending_order(order_number, customer_id).await?;
        if outcome.changed {
            info!("🔄️❌️ Order {order_number} cancelled at customer #{customer_id}'s request");
        }
        Ok(outcome)
    }

    /// Publishes the order-paid event to subscribers. Failures here are logged and swallowed: the
    /// state transition that triggered the notification is already committed and must stand.
    async fn publish_order_paid(&self, order: &Order) {
        let customer = match self.db.fetch_customer(order.customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => {
                error!(
                    "🔄️📬️ Customer #{} vanished before the confirmation for order {} could be dispatched",
                    order.customer_id, order.order_number
                );
                return;
            },
            Err(e) => {
                error!("🔄️📬️ Could not load the customer for order {}: {e}", order.order_number);
                return;
            },
        };
        for producer in &self.producers.order_paid_producer {
            debug!("🔄️📬️ Notifying order-paid subscribers for order {}", order.order_number);
            let event = OrderPaidEvent::new(order.clone(), customer.clone());
            producer.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
