use anyhow::{Context, Result};
use payhook_ingress_stripe::{WebhookConfig, run};

#[tokio::main]
async fn main() -> Result<()> {
    payhook_telemetry::install("payhook-ingress-stripe", env!("CARGO_PKG_VERSION"))?;

    let config = WebhookConfig::from_env().context("invalid stripe webhook configuration")?;
    run(config).await
}
