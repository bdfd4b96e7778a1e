//----------------------------------------------   Webhook  ----------------------------------------------------
//! The gateway-facing webhook ingress.
//!
//! The contract with the gateway is retry-until-200: any non-success answer makes it redeliver
//! the notification. So the handler distinguishes exactly two outcomes. A payload whose signature
//! does not verify is rejected (403) without reading or writing any order state. Everything after
//! signature verification — unknown order, unrecognised status, engine failure — is acknowledged
//! with 200 and a success/failure body, and logged; redelivering a notification we cannot process
//! would only amplify the failure, not fix it.

use actix_web::{web, HttpResponse};
use log::*;
use order_payment_engine::{db_types::OrderNumber, OrderFlowApi, OrderFlowDatabase, OrderFlowError};

use crate::{config::WebhookAuth, data_objects::{JsonResponse, WebhookNotification}, errors::ServerError, route};

route!(payment_webhook => Post "/webhook/payment" impl OrderFlowDatabase);
pub async fn payment_webhook<B>(
    body: web::Json<WebhookNotification>,
    api: web::Data<OrderFlowApi<B>>,
    auth: web::Data<WebhookAuth>,
) -> Result<HttpResponse, ServerError>
where B: OrderFlowDatabase {
    let notification = body.into_inner();
    let order_id = notification.order_id.clone();
    trace!("🔔️ Received payment webhook for order {order_id}");
    if auth.signature_checks {
        if !notification.verify_signature(&auth.server_key) {
            warn!("🔔️ Webhook for order {order_id} failed signature verification; rejecting without applying");
            return Err(ServerError::InvalidSignature);
        }
    } else {
        trace!("🔔️ Signature checks are disabled; accepting the notification as-is");
    }
    // Signature verified: from here on the gateway always gets a 200 so its retry mechanism
    // cannot amplify duplicate work. Failures are logged and reported in the body only.
    let result = match notification.to_update() {
        Err(e) => {
            warn!("🔔️ Webhook for order {order_id} carries an unrecognised status: {e}. Leaving state untouched.");
            JsonResponse::failure(e)
        },
        Ok(update) => {
            let order_number = OrderNumber::from(order_id.clone());
            match api.apply_gateway_update(&order_number, update).await {
                Ok(outcome) if outcome.changed => {
                    info!(
                        "🔔️ Webhook applied to order {order_id}: now {}/{}",
                        outcome.order.status, outcome.order.payment_status
                    );
                    JsonResponse::success("Notification applied.")
                },
                Ok(_) => {
                    debug!("🔔️ Webhook for order {order_id} matched the stored state; nothing to do");
                    JsonResponse::success("Notification already applied.")
                },
                Err(OrderFlowError::OrderNotFound(_)) => {
                    warn!("🔔️ Webhook for unknown order {order_id}");
                    JsonResponse::failure(format!("Unknown order {order_id}"))
                },
                Err(e) => {
                    warn!("🔔️ Webhook processing for order {order_id} failed: {e}");
                    JsonResponse::failure("Internal processing failure.")
                },
            }
        },
    };
    Ok(HttpResponse::Ok().json(result))
}
