//! Conversions between engine records and the gateway's wire format, plus the idempotent
//! payment-session flow shared by checkout and the payment-token endpoint.

use gateway_tools::{
    helpers::{parse_gateway_time, webhook_signature},
    ChargeLineItem,
    ChargeRequest,
    CustomerDetails,
    GatewayApiError,
    PaymentGateway,
    TransactionStatusResponse,
};
use log::*;
use ops_common::Secret;
use order_payment_engine::{
    db_types::{ConversionError, Customer, Order, OrderItem},
    reconciliation::{FraudStatus, GatewayUpdate, TransactionStatus},
    OrderFlowApi,
    OrderFlowDatabase,
};

use crate::{
    data_objects::{PaymentSession, WebhookNotification},
    errors::ServerError,
};

/// Builds the itemised charge for an order: one line per item snapshot, with the shipping fee and
/// any total-level corrections handled by [`ChargeRequest::itemised`].
pub fn charge_for_order(
    order: &Order,
    items: &[OrderItem],
    customer: &Customer,
) -> Result<ChargeRequest, GatewayApiError> {
    let lines = items
        .iter()
        .map(|item| ChargeLineItem::new(item.product_id.to_string(), item.unit_price, item.quantity, &item.product_name))
        .collect();
    let details = CustomerDetails {
        first_name: customer.name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
    };
    ChargeRequest::itemised(order.order_number.as_str(), order.total_amount, lines, details)
}

/// Parses a raw gateway observation into the engine's [`GatewayUpdate`]. Fails when the
/// transaction or fraud status is a string this integration has never heard of; callers log that
/// and leave the order untouched.
pub fn gateway_update(
    transaction_status: &str,
    fraud_status: Option<&str>,
    transaction_id: Option<String>,
    payment_type: Option<String>,
    transaction_time: Option<&str>,
) -> Result<GatewayUpdate, ConversionError> {
    let transaction_status: TransactionStatus = transaction_status.parse()?;
    let fraud_status: Option<FraudStatus> = fraud_status.map(|s| s.parse()).transpose()?;
    let event_time = transaction_time.and_then(parse_gateway_time);
    Ok(GatewayUpdate { transaction_status, fraud_status, transaction_id, payment_type, event_time })
}

impl WebhookNotification {
    /// Recomputes the expected signature over the raw payload strings and compares it to the
    /// supplied `signature_key`.
    pub fn verify_signature(&self, server_key: &Secret<String>) -> bool {
        let expected =
            webhook_signature(&self.order_id, &self.status_code, &self.gross_amount, server_key.reveal());
        expected == self.signature_key
    }

    pub fn to_update(&self) -> Result<GatewayUpdate, ConversionError> {
        gateway_update(
            &self.transaction_status,
            self.fraud_status.as_deref(),
            self.transaction_id.clone(),
            self.payment_type.clone(),
            self.transaction_time.as_deref(),
        )
    }
}

pub fn update_from_status_response(payload: &TransactionStatusResponse) -> Result<GatewayUpdate, ConversionError> {
    gateway_update(
        &payload.transaction_status,
        payload.fraud_status.as_deref(),
        payload.transaction_id.clone(),
        payload.payment_type.clone(),
        payload.transaction_time.as_deref(),
    )
}

/// Returns the order's payment session, creating the remote transaction only when the order does
/// not already carry one. The stored-token check is the idempotency guard that makes this safe to
/// retry after an ambiguous gateway failure.
pub async fn ensure_payment_session<B, G>(
    api: &OrderFlowApi<B>,
    gateway: &G,
    order: &Order,
) -> Result<PaymentSession, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    if let (Some(token), Some(redirect_url)) = (&order.gateway_token, &order.redirect_url) {
        debug!("💳️ Order {} already has a payment session; returning it unchanged", order.order_number);
        return Ok(PaymentSession { token: token.clone(), redirect_url: redirect_url.clone() });
    }
    let customer = api
        .db()
        .fetch_customer(order.customer_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("customer #{}", order.customer_id)))?;
    let items = api.db().fetch_order_items(order.id).await?;
    let charge = charge_for_order(order, &items, &customer)?;
    let response = gateway.create_transaction(&charge).await?;
    api.attach_payment_session(&order.order_number, &response.token, &response.redirect_url).await?;
    info!("💳️ Payment session created for order {}", order.order_number);
    Ok(PaymentSession { token: response.token, redirect_url: response.redirect_url })
}
