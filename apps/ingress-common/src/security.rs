use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;

/// Why a webhook delivery was rejected. The `Display` text is returned to the
/// caller verbatim, so variants carry human-readable messages only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("No {header} header value was provided.")]
    MissingHeader { header: &'static str },
    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,
    #[error(
        "No signatures found matching the expected signature for payload. Are you passing the raw request body you received from {provider}?"
    )]
    SignatureMismatch { provider: &'static str },
    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance,
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// A provider event whose signature has been checked.
///
/// Fields are private: the only way in is [`VerifiedEvent::from_verified_payload`],
/// which verifiers call after the signature matched the raw bytes. Only `type`
/// is mandatory; everything else defaults so any signed event can be dispatched.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedEvent {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    created: i64,
    #[serde(default)]
    livemode: bool,
    #[serde(default)]
    data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EventData {
    #[serde(default)]
    object: Value,
}

impl VerifiedEvent {
    /// Parses an already-authenticated payload.
    pub fn from_verified_payload(payload: &[u8]) -> Result<Self, VerificationError> {
        serde_json::from_slice(payload).map_err(|err| {
            tracing::debug!(error = %err, "verified payload is not a provider event");
            VerificationError::InvalidPayload(err.to_string())
        })
    }

    /// Empty when the provider sent no id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn livemode(&self) -> bool {
        self.livemode
    }

    /// The opaque `data.object` payload.
    pub fn object(&self) -> &Value {
        &self.data.object
    }
}

/// Checks a webhook signature over the exact request bytes and, on success,
/// yields the parsed event.
///
/// ```no_run
/// use async_trait::async_trait;
/// use payhook_ingress_common::{VerificationError, VerifiedEvent, WebhookVerifier};
/// use secrecy::SecretString;
///
/// struct AcceptAll;
///
/// #[async_trait]
/// impl WebhookVerifier for AcceptAll {
///     async fn verify(
///         &self,
///         payload: &[u8],
///         _signature: Option<&str>,
///         _secret: &SecretString,
///     ) -> Result<VerifiedEvent, VerificationError> {
///         VerifiedEvent::from_verified_payload(payload)
///     }
/// }
/// ```
#[async_trait]
pub trait WebhookVerifier: Send + Sync {
    async fn verify(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        secret: &SecretString,
    ) -> Result<VerifiedEvent, VerificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_event_envelope() {
        let payload = json!({
            "id": "evt_123",
            "object": "event",
            "type": "payment_intent.succeeded",
            "api_version": "2023-10-16",
            "created": 1_700_000_000,
            "livemode": false,
            "data": { "object": { "id": "pi_1", "amount": 2000 } }
        });
        let event = VerifiedEvent::from_verified_payload(payload.to_string().as_bytes()).unwrap();
        assert_eq!(event.id(), "evt_123");
        assert_eq!(event.event_type(), "payment_intent.succeeded");
        assert_eq!(event.api_version(), Some("2023-10-16"));
        assert_eq!(event.created(), 1_700_000_000);
        assert!(!event.livemode());
        assert_eq!(event.object()["amount"], 2000);
    }

    #[test]
    fn only_type_is_required() {
        let event = VerifiedEvent::from_verified_payload(br#"{"type":"charge.refunded"}"#).unwrap();
        assert_eq!(event.event_type(), "charge.refunded");
        assert_eq!(event.id(), "");
        assert!(event.object().is_null());

        let event =
            VerifiedEvent::from_verified_payload(br#"{"type":"charge.refunded","data":{}}"#).unwrap();
        assert!(event.object().is_null());
    }

    #[test]
    fn missing_type_is_invalid_payload() {
        let payload = br#"{"id":"evt_1","data":{"object":{}}}"#;
        let err = VerifiedEvent::from_verified_payload(payload).unwrap_err();
        assert!(matches!(err, VerificationError::InvalidPayload(_)));
        assert!(err.to_string().starts_with("Invalid webhook payload: "));
    }

    #[test]
    fn messages_are_human_readable() {
        let missing = VerificationError::MissingHeader {
            header: "stripe-signature",
        };
        assert_eq!(
            missing.to_string(),
            "No stripe-signature header value was provided."
        );
        let mismatch = VerificationError::SignatureMismatch { provider: "Stripe" };
        assert!(mismatch.to_string().ends_with("you received from Stripe?"));
    }
}
