use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::security::VerificationError;

pub const EVENT_RECEIVED: &str = "Event received";

/// Plain-text 400 carrying the verification failure back to the provider.
pub fn webhook_error(err: &VerificationError) -> Response {
    (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response()
}

/// Plain-text 200 acknowledging a verified delivery.
pub fn event_received() -> Response {
    (StatusCode::OK, EVENT_RECEIVED).into_response()
}
