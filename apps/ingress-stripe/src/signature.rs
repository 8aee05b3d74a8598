//! `Stripe-Signature` verification.
//!
//! The header looks like `t=1700000000,v1=<hex>,v1=<hex>,v0=<hex>`. The signed
//! content is the timestamp, a dot, then the raw request body; any `v1` entry
//! matching HMAC-SHA256 under the endpoint secret authenticates the delivery.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use payhook_ingress_common::{VerificationError, VerifiedEvent, WebhookVerifier};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
const PROVIDER: &str = "Stripe";
const EXPECTED_SCHEME: &str = "v1";

#[derive(Debug, Clone, Copy)]
pub struct StripeSignatureVerifier {
    tolerance: Duration,
}

#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl StripeSignatureVerifier {
    /// A zero `tolerance` disables the timestamp age check.
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    /// Verifies against an explicit clock (unix seconds).
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        secret: &SecretString,
        now: i64,
    ) -> Result<VerifiedEvent, VerificationError> {
        let header = signature
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(VerificationError::MissingHeader {
                header: SIGNATURE_HEADER,
            })?;
        let parsed = parse_signature_header(header)?;

        let expected = signed_digest(secret.expose_secret().as_bytes(), parsed.timestamp, payload)
            .ok_or(VerificationError::SignatureMismatch { provider: PROVIDER })?;
        let matched = parsed
            .signatures
            .iter()
            .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));
        if !matched {
            return Err(VerificationError::SignatureMismatch { provider: PROVIDER });
        }

        let tolerance = i64::try_from(self.tolerance.as_secs()).unwrap_or(i64::MAX);
        if tolerance > 0 && parsed.timestamp < now.saturating_sub(tolerance) {
            return Err(VerificationError::TimestampOutsideTolerance);
        }

        VerifiedEvent::from_verified_payload(payload)
    }
}

#[async_trait]
impl WebhookVerifier for StripeSignatureVerifier {
    async fn verify(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        secret: &SecretString,
    ) -> Result<VerifiedEvent, VerificationError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.verify_at(payload, signature, secret, now)
    }
}

/// Builds a header the verifier accepts for `payload` signed at `timestamp`.
///
/// ```
/// use payhook_ingress_stripe::signature::generate_signature_header;
///
/// let header = generate_signature_header("whsec_test", 1_700_000_000, b"{}");
/// assert!(header.starts_with("t=1700000000,v1="));
/// ```
pub fn generate_signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let digest = signed_digest(secret.as_bytes(), timestamp, payload).unwrap_or_default();
    format!("t={timestamp},{EXPECTED_SCHEME}={}", hex::encode(digest))
}

fn signed_digest(secret: &[u8], timestamp: i64, payload: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(mac.finalize().into_bytes().to_vec())
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, VerificationError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    let mut saw_scheme = false;

    for item in header.split(',') {
        let Some((key, value)) = item.split_once('=') else {
            continue;
        };
        match key.trim() {
            "t" => timestamp = value.trim().parse::<i64>().ok(),
            EXPECTED_SCHEME => {
                saw_scheme = true;
                // Undecodable entries can never match; skip them.
                if let Ok(bytes) = hex::decode(value.trim()) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if saw_scheme => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(VerificationError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;
    const EVENT: &[u8] =
        br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;

    fn secret() -> SecretString {
        SecretString::from(SECRET.to_string())
    }

    fn verifier() -> StripeSignatureVerifier {
        StripeSignatureVerifier::new(Duration::from_secs(300))
    }

    #[test]
    fn accepts_valid_signature() {
        let header = generate_signature_header(SECRET, NOW, EVENT);
        let event = verifier()
            .verify_at(EVENT, Some(&header), &secret(), NOW)
            .unwrap();
        assert_eq!(event.id(), "evt_1");
        assert_eq!(event.event_type(), "payment_intent.succeeded");
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let valid = generate_signature_header(SECRET, NOW, EVENT);
        let v1 = valid.split_once(",v1=").unwrap().1;
        let header = format!("t={NOW},v1=deadbeef,v1=zz,v0=abcd,v1={v1}");
        assert!(verifier().verify_at(EVENT, Some(&header), &secret(), NOW).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let header = generate_signature_header(SECRET, NOW, EVENT);
        for index in 0..EVENT.len() {
            let mut tampered = EVENT.to_vec();
            tampered[index] ^= 0x01;
            let err = verifier()
                .verify_at(&tampered, Some(&header), &secret(), NOW)
                .unwrap_err();
            assert_eq!(err, VerificationError::SignatureMismatch { provider: "Stripe" });
        }
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = generate_signature_header("whsec_other", NOW, EVENT);
        let err = verifier()
            .verify_at(EVENT, Some(&header), &secret(), NOW)
            .unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch { .. }));
    }

    #[test]
    fn rejects_missing_or_blank_header() {
        for header in [None, Some(""), Some("   ")] {
            let err = verifier().verify_at(EVENT, header, &secret(), NOW).unwrap_err();
            assert_eq!(
                err.to_string(),
                "No stripe-signature header value was provided."
            );
        }
    }

    #[test]
    fn rejects_malformed_headers() {
        for header in ["garbage", "v1=abcd", "t=soon,v1=abcd", "t=1700000000", "t=1700000000,v0=abcd"] {
            let err = verifier()
                .verify_at(EVENT, Some(header), &secret(), NOW)
                .unwrap_err();
            assert_eq!(err, VerificationError::MalformedHeader, "header {header:?}");
        }
    }

    #[test]
    fn rejects_stale_timestamp() {
        let signed_at = NOW - 301;
        let header = generate_signature_header(SECRET, signed_at, EVENT);
        let err = verifier()
            .verify_at(EVENT, Some(&header), &secret(), NOW)
            .unwrap_err();
        assert_eq!(err, VerificationError::TimestampOutsideTolerance);

        let edge = generate_signature_header(SECRET, NOW - 300, EVENT);
        assert!(verifier().verify_at(EVENT, Some(&edge), &secret(), NOW).is_ok());
    }

    #[test]
    fn zero_tolerance_skips_age_check() {
        let header = generate_signature_header(SECRET, 1, EVENT);
        let lenient = StripeSignatureVerifier::new(Duration::ZERO);
        assert!(lenient.verify_at(EVENT, Some(&header), &secret(), NOW).is_ok());
    }

    #[test]
    fn signed_non_event_payload_is_invalid() {
        let body = [0xff, 0xfe, b'{'];
        let header = generate_signature_header(SECRET, NOW, &body);
        let err = verifier()
            .verify_at(&body, Some(&header), &secret(), NOW)
            .unwrap_err();
        assert!(matches!(err, VerificationError::InvalidPayload(_)));
    }

    #[test]
    fn parse_keeps_only_decodable_v1_entries() {
        let parsed = parse_signature_header(" t = 42 , v1=00ff, v1=xyz, v0=11").unwrap();
        assert_eq!(
            parsed,
            SignatureHeader {
                timestamp: 42,
                signatures: vec![vec![0x00, 0xff]],
            }
        );
    }

    #[tokio::test]
    async fn trait_impl_uses_wall_clock() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let header = generate_signature_header(SECRET, now, EVENT);
        let event = verifier()
            .verify(EVENT, Some(&header), &secret())
            .await
            .unwrap();
        assert_eq!(event.object()["id"], "pi_1");
    }
}
