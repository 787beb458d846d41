use crate::errors::WebhookError;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 5-minute replay window, per spec.
const REPLAY_WINDOW_SECONDS: i64 = 300;

/// Verify a signed webhook request: `HMAC-SHA256(secret, "v0:" + timestamp +
/// ":" + raw_body)`, compared in constant time against the received
/// signature, and a timestamp no more than 5 minutes stale.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: &str,
    raw_body: &[u8],
    received_signature: &str,
) -> Result<(), WebhookError> {
    check_timestamp_fresh(timestamp)?;

    let basestring = format!(
        "v0:{}:{}",
        timestamp,
        std::str::from_utf8(raw_body).unwrap_or_default()
    );

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(basestring.as_bytes());

    let received_hex = received_signature
        .strip_prefix("v0=")
        .ok_or(WebhookError::InvalidSignature)?;
    let received_bytes = hex::decode(received_hex).map_err(|_| WebhookError::InvalidSignature)?;

    mac.verify_slice(&received_bytes)
        .map_err(|_| WebhookError::InvalidSignature)
}

fn check_timestamp_fresh(timestamp: &str) -> Result<(), WebhookError> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| WebhookError::StaleTimestamp)?;
    let now = Utc::now().timestamp();
    if (now - ts).abs() > REPLAY_WINDOW_SECONDS {
        return Err(WebhookError::StaleTimestamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: &str, raw_body: &[u8]) -> String {
        let basestring = format!(
            "v0:{}:{}",
            timestamp,
            std::str::from_utf8(raw_body).unwrap_or_default()
        );
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(basestring.as_bytes());
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_with_fresh_timestamp_is_accepted() {
        let secret = "shhh";
        let body = b"{\"action\":\"approve\"}";
        let now = Utc::now().timestamp().to_string();
        let signature = sign(secret, &now, body);

        assert!(verify_signature(secret, &now, body, &signature).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let secret = "shhh";
        let now = Utc::now().timestamp().to_string();
        let signature = sign(secret, &now, b"{\"action\":\"approve\"}");

        let result = verify_signature(secret, &now, b"{\"action\":\"reject\"}", &signature);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn stale_timestamp_is_rejected_even_with_valid_signature() {
        let secret = "shhh";
        let body = b"payload";
        let stale = (Utc::now().timestamp() - 600).to_string();
        let signature = sign(secret, &stale, body);

        let result = verify_signature(secret, &stale, body, &signature);
        assert!(matches!(result, Err(WebhookError::StaleTimestamp)));
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let secret = "shhh";
        let result = verify_signature(secret, "not-a-number", b"body", "v0=deadbeef");
        assert!(matches!(result, Err(WebhookError::StaleTimestamp)));
    }
}
