use rand::Rng;

use crate::db_types::OrderNumber;

/// Hard upper bound on order-number length. The gateway uses the order number as its transaction
/// key and rejects identifiers longer than this.
pub const ORDER_NUMBER_MAX_LEN: usize = 20;

const PREFIX: &str = "ON-";
const SUFFIX_LEN: usize = 10;
// I, O, 0 and 1 are excluded so the number survives being read over the phone.
const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a fresh order number: a fixed prefix plus a random alphanumeric suffix.
///
/// Uniqueness is ultimately enforced by the unique index on `orders.order_number`; the 32^10
/// suffix space makes collisions a retry case rather than something to engineer around.
pub fn generate_order_number() -> OrderNumber {
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..SUFFIX_LEN).map(|_| char::from(CHARSET[rng.gen_range(0..CHARSET.len())])).collect();
    OrderNumber(format!("{PREFIX}{suffix}"))
}
