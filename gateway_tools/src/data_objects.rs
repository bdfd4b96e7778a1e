use log::warn;
use ops_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    helpers::truncate_item_name,
    GatewayApiError,
};

/// The smallest amount the gateway will accept for a transaction, in minor units.
pub const MIN_GROSS_AMOUNT: i64 = 1_000;

pub const SHIPPING_ITEM_ID: &str = "SHIPPING";
pub const ADJUSTMENT_ITEM_ID: &str = "ADJUSTMENT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// The local order number; the gateway keys the transaction on it.
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeLineItem {
    pub id: String,
    /// Integer unit price in minor units.
    pub price: i64,
    pub quantity: i64,
    pub name: String,
}

impl ChargeLineItem {
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, price: Money, quantity: i64, name: S2) -> Self {
        Self { id: id.into(), price: price.value(), quantity, name: name.into() }
    }

    pub fn line_total(&self) -> i64 {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

//--------------------------------------    ChargeRequest    ---------------------------------------------------------
/// An itemised transaction-creation request. Build it with [`ChargeRequest::itemised`], which
/// enforces the gateway's requirement that the line items sum *exactly* to the gross amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ChargeLineItem>,
    pub customer_details: CustomerDetails,
}

impl ChargeRequest {
    /// Builds the itemised request for an order.
    ///
    /// `lines` carries one entry per order item, priced in minor units. When the order total
    /// exceeds the item sum (the shipping fee), a synthetic `SHIPPING` line makes up the
    /// difference. Whatever residue is left after that — discounts applied to the total, or
    /// historical float rounding in imported orders — is folded into the last line's unit price,
    /// with a one-quantity `ADJUSTMENT` line absorbing any remainder that does not divide by the
    /// last line's quantity. The result always sums exactly to `total_amount`.
    pub fn itemised(
        order_id: &str,
        total_amount: Money,
        lines: Vec<ChargeLineItem>,
        customer: CustomerDetails,
    ) -> Result<Self, GatewayApiError> {
        if lines.is_empty() {
            return Err(GatewayApiError::Validation(format!("order {order_id} has no items to charge")));
        }
        if total_amount.value() < MIN_GROSS_AMOUNT {
            return Err(GatewayApiError::Validation(format!(
                "gross amount {total_amount} is below the gateway minimum of {MIN_GROSS_AMOUNT}"
            )));
        }
        let mut items: Vec<ChargeLineItem> =
            lines.into_iter().map(|mut item| {
                item.name = truncate_item_name(&item.name);
                item
            }).collect();
        let items_total: i64 = items.iter().map(ChargeLineItem::line_total).sum();
        let shipping_delta = total_amount.value() - items_total;
        if shipping_delta > 0 {
            items.push(ChargeLineItem {
                id: SHIPPING_ITEM_ID.to_string(),
                price: shipping_delta,
                quantity: 1,
                name: "Shipping".to_string(),
            });
        }
        let line_sum: i64 = items.iter().map(ChargeLineItem::line_total).sum();
        let mut diff = total_amount.value() - line_sum;
        if diff != 0 {
            // The gateway requires exact equality; correct the last line and say so.
            warn!(
                "💳️ Charge for order {order_id} was off by {diff} against its line items; correcting the last line \
                 item"
            );
            if let Some(last) = items.last_mut() {
                let per_unit = diff / last.quantity;
                last.price += per_unit;
                diff -= per_unit * last.quantity;
            }
            if diff != 0 {
                items.push(ChargeLineItem {
                    id: ADJUSTMENT_ITEM_ID.to_string(),
                    price: diff,
                    quantity: 1,
                    name: "Rounding adjustment".to_string(),
                });
            }
        }
        Ok(Self {
            transaction_details: TransactionDetails {
                order_id: order_id.to_string(),
                gross_amount: total_amount.value(),
            },
            item_details: items,
            customer_details: customer,
        })
    }

    pub fn line_item_sum(&self) -> i64 {
        self.item_details.iter().map(ChargeLineItem::line_total).sum()
    }
}

//--------------------------------------    ChargeResponse   ---------------------------------------------------------
/// The gateway's answer to a successful transaction creation: an opaque token the buyer uses to
/// complete payment, and the hosted payment-page URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResponse {
    pub token: String,
    pub redirect_url: String,
}

//--------------------------------- TransactionStatusResponse --------------------------------------------------------
/// The gateway's view of a transaction, as returned by the status query. String-typed on purpose:
/// interpretation happens in the engine's reconciliation core, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
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
    #[serde(default)]
    pub gross_amount: Option<String>,
}
