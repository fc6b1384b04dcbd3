use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    Some(mac)
}

/// Hex HMAC-SHA256 of `order_id|payment_id`, as the gateway's checkout widget reports it.
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    mac_for(secret, order_id, payment_id).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Checks a gateway payment signature in constant time.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    mac_for(secret, order_id, payment_id)
        .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}
