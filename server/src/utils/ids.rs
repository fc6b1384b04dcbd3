use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

const ORDER_PREFIX: &str = "ORD";
const TICKET_PREFIX: &str = "TKT";
const ORDER_SUFFIX_LEN: usize = 6;
const TICKET_SUFFIX_LEN: usize = 8;

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect()
}

/// Human-readable order reference, `ORD-<unix-ms>-<random>`.
pub fn order_reference(now: DateTime<Utc>) -> String {
    format!(
        "{ORDER_PREFIX}-{}-{}",
        now.timestamp_millis(),
        random_suffix(ORDER_SUFFIX_LEN)
    )
}

/// Opaque ticket code printed into the QR image, `TKT-<unix-ms>-<random>`.
pub fn ticket_code(now: DateTime<Utc>) -> String {
    format!(
        "{TICKET_PREFIX}-{}-{}",
        now.timestamp_millis(),
        random_suffix(TICKET_SUFFIX_LEN)
    )
}
