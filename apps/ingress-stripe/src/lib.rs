//! Stripe webhook ingress service.
//!
//! Exposes a `POST` endpoint that checks the `Stripe-Signature` header against
//! the raw request body, dispatches verified events by type, and answers with
//! the plain-text acknowledgements Stripe expects.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod signature;

use anyhow::Result;
use axum::serve;
use tokio::net::TcpListener;
use tracing::info;

pub use config::WebhookConfig;
pub use dispatch::{DispatchOutcome, EventDispatcher, EventHandler};
pub use http::{AppState, build_router};
pub use signature::{StripeSignatureVerifier, generate_signature_header};

/// Serves the webhook endpoint until Ctrl-C.
pub async fn run(config: WebhookConfig) -> Result<()> {
    let addr = config.addr;
    info!(
        path = %config.webhook_path,
        api_version = %config.api_version,
        key_mode = config.key_mode(),
        tolerance_secs = config.tolerance.as_secs(),
        "stripe webhook configuration loaded"
    );

    let router = build_router(AppState::stripe(config));
    let listener = TcpListener::bind(addr).await?;
    info!("ingress-stripe listening on {}", addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
