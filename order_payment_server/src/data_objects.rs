use std::fmt::Display;

use ops_common::Money;
use order_payment_engine::{
    db_types::{Order, OrderItem, ShippingDetails},
    order_objects::OrderResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------   CheckoutRequest   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping: ShippingDetails,
    pub shipping_fee: Money,
    #[serde(default)]
    pub payment_method: Option<String>,
}

//--------------------------------------   PaymentSession    ---------------------------------------------------------
/// The gateway handle the storefront needs to send the buyer off to pay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub token: String,
    pub redirect_url: String,
}

//--------------------------------------  CheckoutResponse   ---------------------------------------------------------
/// The order is committed before the gateway is contacted, so a gateway failure leaves a valid
/// pending order behind; `payment` is absent and `payment_error` says why, and the client can
/// retry through the payment-token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub order: OrderResult,
    pub payment: Option<PaymentSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_error: Option<String>,
}

//-------------------------------------- WebhookNotification ---------------------------------------------------------
/// The gateway's webhook payload. All fields stay raw strings: the signature is computed over the
/// exact bytes the gateway sent, and status interpretation belongs to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub transaction_time: Option<String>,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
}

//--------------------------------------   StatusResponse    ---------------------------------------------------------
/// Local order state plus the remote status as observed by the reconciliation this request just
/// triggered. `remote_status` is absent when the order has no gateway transaction yet, or when
/// the gateway no longer remembers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub remote_status: Option<String>,
}
