use payhook_telemetry::{TelemetryLabels, record_counter, with_common_fields};
use tracing::Span;

use crate::security::{VerificationError, VerifiedEvent};

const WEBHOOK_RECEIVED_COUNTER: &str = "webhooks_received";
const VERIFICATION_FAILED_COUNTER: &str = "webhook_verification_failed";
const WEBHOOK_SPAN_NAME: &str = "ingress.webhook";

/// Opens the per-delivery span. Event fields are recorded once verification succeeds.
pub fn start_webhook_span(provider: &str, request_id: Option<&str>) -> Span {
    tracing::info_span!(
        WEBHOOK_SPAN_NAME,
        provider = %provider,
        request_id = %request_id.unwrap_or("n/a"),
        event_type = tracing::field::Empty,
        event_id = tracing::field::Empty,
    )
}

/// Records the verified event on `span` and bumps the received counter.
pub fn record_webhook_received(span: &Span, provider: &str, event: &VerifiedEvent) {
    with_common_fields(span, provider, Some(event.event_type()), Some(event.id()));
    let labels = TelemetryLabels::new(provider).with_event(event.event_type(), event.id());
    record_counter(WEBHOOK_RECEIVED_COUNTER, 1, &labels);
}

pub fn record_verification_failure(provider: &str, err: &VerificationError) {
    let labels = TelemetryLabels::new(provider).with_extra("reason", failure_reason(err));
    record_counter(VERIFICATION_FAILED_COUNTER, 1, &labels);
}

fn failure_reason(err: &VerificationError) -> &'static str {
    match err {
        VerificationError::MissingHeader { .. } => "missing_header",
        VerificationError::MalformedHeader => "malformed_header",
        VerificationError::SignatureMismatch { .. } => "signature_mismatch",
        VerificationError::TimestampOutsideTolerance => "stale_timestamp",
        VerificationError::InvalidPayload(_) => "invalid_payload",
    }
}
