use metrics::Label;
use tracing::Span;

use crate::context::TelemetryLabels;

pub fn record_counter(name: &'static str, value: u64, labels: &TelemetryLabels) {
    let labels: Vec<Label> = labels
        .tags()
        .into_iter()
        .map(|(key, value)| Label::new(key, value))
        .collect();
    metrics::counter!(name, labels).increment(value);
}

pub fn with_common_fields(
    span: &Span,
    provider: &str,
    event_type: Option<&str>,
    event_id: Option<&str>,
) {
    span.record("provider", tracing::field::display(provider));
    if let Some(event_type) = event_type {
        span.record("event_type", tracing::field::display(event_type));
    }
    if let Some(event_id) = event_id {
        span.record("event_id", tracing::field::display(event_id));
    }
}
