use std::sync::Arc;

use axum::{
    Extension, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use payhook_ingress_common::{
    RequestId, WebhookVerifier, event_received, record_verification_failure,
    record_webhook_received, start_webhook_span, webhook_error, with_request_id,
};
use tracing::{Instrument, Span};

use crate::config::{HEALTH_PATH, WebhookConfig};
use crate::dispatch::EventDispatcher;
use crate::signature::{SIGNATURE_HEADER, StripeSignatureVerifier};

const PROVIDER_ID: &str = "stripe";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebhookConfig>,
    pub verifier: Arc<dyn WebhookVerifier>,
    pub dispatcher: Arc<EventDispatcher>,
}

impl AppState {
    pub fn new<V>(config: WebhookConfig, verifier: V, dispatcher: EventDispatcher) -> Self
    where
        V: WebhookVerifier + 'static,
    {
        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Production wiring: Stripe signatures and the default event handlers.
    pub fn stripe(config: WebhookConfig) -> Self {
        let verifier = StripeSignatureVerifier::new(config.tolerance);
        Self::new(config, verifier, EventDispatcher::stripe_defaults())
    }
}

pub fn build_router(state: AppState) -> Router {
    let webhook_path = state.config.webhook_path.clone();
    Router::new()
        .route(&webhook_path, post(handle))
        .route(HEALTH_PATH, get(healthz))
        .layer(middleware::from_fn(with_request_id))
        .with_state(state)
}

/// Verifies the delivery over the exact body bytes, dispatches it, and acknowledges.
pub async fn handle(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let span = start_webhook_span(PROVIDER_ID, Some(&request_id.0));
    async move {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());

        let event = match state
            .verifier
            .verify(&body, signature, &state.config.webhook_secret)
            .await
        {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "stripe webhook verification failed");
                record_verification_failure(PROVIDER_ID, &err);
                return webhook_error(&err);
            }
        };

        record_webhook_received(&Span::current(), PROVIDER_ID, &event);
        if let Some(version) = event.api_version() {
            if version != state.config.api_version {
                tracing::warn!(
                    event_version = %version,
                    expected_version = %state.config.api_version,
                    "stripe event api version differs from configured version"
                );
            }
        }

        let outcome = state.dispatcher.dispatch(&event);
        tracing::debug!(?outcome, "stripe event dispatched");
        event_received()
    }
    .instrument(span)
    .await
}

async fn healthz() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
