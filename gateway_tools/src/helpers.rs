use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use ops_common::Money;
use sha2::{Digest, Sha512};

use crate::GatewayApiError;

/// The gateway truncates item names beyond this length; we truncate ourselves so the request we
/// sign and reconcile is the request the gateway stores.
pub const MAX_ITEM_NAME_LEN: usize = 50;

/// The signature the gateway attaches to webhook notifications:
/// `sha512(order_id + status_code + gross_amount + server_key)`, lowercase hex.
///
/// The inputs are the *raw payload strings*, not parsed values — re-formatting the amount would
/// change the digest.
pub fn webhook_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Truncates an item name to the gateway's limit on a character boundary.
pub fn truncate_item_name(name: &str) -> String {
    if name.chars().count() <= MAX_ITEM_NAME_LEN {
        name.to_string()
    } else {
        name.chars().take(MAX_ITEM_NAME_LEN).collect()
    }
}

/// Parses the gateway's decimal-string amounts ("125000.00") into minor units. The fractional
/// part is always zero for the currencies the gateway settles in; a non-zero fraction is logged
/// and dropped.
pub fn parse_gateway_amount(s: &str) -> Result<Money, GatewayApiError> {
    let (whole, fraction) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };
    if let Some(f) = fraction {
        if f.chars().any(|c| c != '0') {
            warn!("Gateway amount '{s}' has a non-zero fraction; truncating");
        }
    }
    whole
        .parse::<i64>()
        .map(Money::from)
        .map_err(|e| GatewayApiError::JsonError(format!("'{s}' is not a valid gateway amount: {e}")))
}

/// Parses the gateway's event timestamps ("2024-06-01 12:00:00"). The gateway reports wall-clock
/// time without an offset; it is recorded as-is.
pub fn parse_gateway_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok().map(|naive| naive.and_utc())
}
