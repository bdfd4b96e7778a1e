//! Mapping from gateway transaction states to local order state.
//!
//! Both notification paths (the webhook push and the status poll) funnel their observations into
//! [`GatewayUpdate`] and resolve it through [`map_status`]. There is exactly one copy of the
//! mapping; handlers never interpret gateway statuses themselves.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::debug;

use crate::db_types::{ConversionError, OrderStatus, PaymentStatus};

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
/// Transaction states reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Expire,
    Cancel,
    Refund,
    PartialRefund,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Capture => write!(f, "capture"),
            TransactionStatus::Settlement => write!(f, "settlement"),
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Deny => write!(f, "deny"),
            TransactionStatus::Expire => write!(f, "expire"),
            TransactionStatus::Cancel => write!(f, "cancel"),
            TransactionStatus::Refund => write!(f, "refund"),
            TransactionStatus::PartialRefund => write!(f, "partial_refund"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capture" => Ok(Self::Capture),
            "settlement" => Ok(Self::Settlement),
            "pending" => Ok(Self::Pending),
            "deny" => Ok(Self::Deny),
            "expire" => Ok(Self::Expire),
            "cancel" => Ok(Self::Cancel),
            "refund" => Ok(Self::Refund),
            "partial_refund" => Ok(Self::PartialRefund),
            s => Err(ConversionError(format!("Unrecognised transaction status: {s}"))),
        }
    }
}

//--------------------------------------     FraudStatus     ---------------------------------------------------------
/// The gateway's fraud-detection verdict, attached to `capture` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudStatus {
    Accept,
    Challenge,
    Deny,
}

impl Display for FraudStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FraudStatus::Accept => write!(f, "accept"),
            FraudStatus::Challenge => write!(f, "challenge"),
            FraudStatus::Deny => write!(f, "deny"),
        }
    }
}

impl FromStr for FraudStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Self::Accept),
            "challenge" => Ok(Self::Challenge),
            "deny" => Ok(Self::Deny),
            s => Err(ConversionError(format!("Unrecognised fraud status: {s}"))),
        }
    }
}

//--------------------------------------    GatewayUpdate    ---------------------------------------------------------
/// A single observation of the remote transaction, from either notification path.
#[derive(Debug, Clone)]
pub struct GatewayUpdate {
    pub transaction_status: TransactionStatus,
    pub fraud_status: Option<FraudStatus>,
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
    /// The gateway's event timestamp. Used as `paid_at` on a transition into `Paid`.
    pub event_time: Option<DateTime<Utc>>,
}

//--------------------------------------    StatusMapping    ---------------------------------------------------------
/// The local target state for a recognised gateway status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMapping {
    /// `None` means the fulfilment status is left as-is (partial refunds do not cancel an order).
    pub order_status: Option<OrderStatus>,
    pub payment_status: PaymentStatus,
}

impl StatusMapping {
    fn to(order_status: OrderStatus, payment_status: PaymentStatus) -> Option<Self> {
        Some(Self { order_status: Some(order_status), payment_status })
    }
}

/// Resolve a gateway observation to its local target state.
///
/// Returns `None` for combinations the mapping does not recognise; callers log these and leave the
/// order untouched rather than guessing.
pub fn map_status(status: TransactionStatus, fraud: Option<FraudStatus>) -> Option<StatusMapping> {
    use OrderStatus::{Cancelled, Pending};
    match (status, fraud) {
        (TransactionStatus::Capture, Some(FraudStatus::Accept)) => {
            StatusMapping::to(Pending, PaymentStatus::Paid)
        },
        (TransactionStatus::Capture, Some(FraudStatus::Challenge)) => {
            StatusMapping::to(Pending, PaymentStatus::Pending)
        },
        (TransactionStatus::Capture, None) => {
            // The gateway omits the fraud verdict on non-card flows, where a capture is only ever
            // reported once it has been accepted.
            debug!("🔁️ capture notification without a fraud status; treating as accepted");
            StatusMapping::to(Pending, PaymentStatus::Paid)
        },
        (TransactionStatus::Capture, Some(FraudStatus::Deny)) => None,
        (TransactionStatus::Settlement, _) => StatusMapping::to(Pending, PaymentStatus::Paid),
        (TransactionStatus::Pending, _) => StatusMapping::to(Pending, PaymentStatus::Pending),
        (TransactionStatus::Deny, _) => StatusMapping::to(Cancelled, PaymentStatus::Cancelled),
        (TransactionStatus::Expire, _) => StatusMapping::to(Cancelled, PaymentStatus::Expired),
        (TransactionStatus::Cancel, _) => StatusMapping::to(Cancelled, PaymentStatus::Cancelled),
        (TransactionStatus::Refund, _) => StatusMapping::to(Cancelled, PaymentStatus::Refund),
        (TransactionStatus::PartialRefund, _) => {
            Some(StatusMapping { order_status: None, payment_status: PaymentStatus::PartialRefund })
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mapped(status: TransactionStatus, fraud: Option<FraudStatus>) -> StatusMapping {
        map_status(status, fraud).expect("expected a mapping")
    }

    #[test]
    fn capture_accept_is_paid_but_not_fulfilled() {
        let m = mapped(TransactionStatus::Capture, Some(FraudStatus::Accept));
        assert_eq!(m.order_status, Some(OrderStatus::Pending));
        assert_eq!(m.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn capture_challenge_stays_pending() {
        let m = mapped(TransactionStatus::Capture, Some(FraudStatus::Challenge));
        assert_eq!(m.order_status, Some(OrderStatus::Pending));
        assert_eq!(m.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn capture_without_fraud_verdict_is_accepted() {
        let m = mapped(TransactionStatus::Capture, None);
        assert_eq!(m.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn capture_with_fraud_deny_is_unmapped() {
        assert!(map_status(TransactionStatus::Capture, Some(FraudStatus::Deny)).is_none());
    }

    #[test]
    fn settlement_is_paid() {
        let m = mapped(TransactionStatus::Settlement, None);
        assert_eq!(m.order_status, Some(OrderStatus::Pending));
        assert_eq!(m.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn pending_is_pending() {
        let m = mapped(TransactionStatus::Pending, None);
        assert_eq!(m.order_status, Some(OrderStatus::Pending));
        assert_eq!(m.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn deny_cancels() {
        let m = mapped(TransactionStatus::Deny, None);
        assert_eq!(m.order_status, Some(OrderStatus::Cancelled));
        assert_eq!(m.payment_status, PaymentStatus::Cancelled);
    }

    #[test]
    fn expire_cancels_with_expired_payment() {
        let m = mapped(TransactionStatus::Expire, None);
        assert_eq!(m.order_status, Some(OrderStatus::Cancelled));
        assert_eq!(m.payment_status, PaymentStatus::Expired);
    }

    #[test]
    fn cancel_cancels() {
        let m = mapped(TransactionStatus::Cancel, None);
        assert_eq!(m.order_status, Some(OrderStatus::Cancelled));
        assert_eq!(m.payment_status, PaymentStatus::Cancelled);
    }

    #[test]
    fn refund_cancels_with_refund_payment() {
        let m = mapped(TransactionStatus::Refund, None);
        assert_eq!(m.order_status, Some(OrderStatus::Cancelled));
        assert_eq!(m.payment_status, PaymentStatus::Refund);
    }

    #[test]
    fn partial_refund_leaves_fulfilment_alone() {
        let m = mapped(TransactionStatus::PartialRefund, None);
        assert_eq!(m.order_status, None);
        assert_eq!(m.payment_status, PaymentStatus::PartialRefund);
    }

    #[test]
    fn fraud_status_is_ignored_outside_capture() {
        let m = mapped(TransactionStatus::Settlement, Some(FraudStatus::Challenge));
        assert_eq!(m.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn unknown_statuses_fail_to_parse() {
        assert!("authorize".parse::<TransactionStatus>().is_err());
        assert!("maybe".parse::<FraudStatus>().is_err());
    }
}
