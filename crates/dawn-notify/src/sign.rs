use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generates the webhook signature pair `(timestamp, sign)` for the current
/// time. `sign = base64(hmac_sha256(key = secret, msg = "{ts}\n{secret}"))`.
pub fn gen_signature(secret: &str) -> Result<(String, String), String> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string();
    let sign = sign_with_timestamp(secret, &timestamp)?;
    Ok((timestamp, sign))
}

/// Signature computation split out for deterministic testing.
pub fn sign_with_timestamp(secret: &str, timestamp: &str) -> Result<String, String> {
    if secret.is_empty() {
        return Err("secret must be non-empty to generate signature".to_string());
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|error| format!("invalid hmac key: {error}"))?;
    mac.update(format!("{timestamp}\n{secret}").as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
