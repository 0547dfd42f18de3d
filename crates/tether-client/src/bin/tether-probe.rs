//! # Tether probe
//!
//! Connects to the gateway described by a bootstrap snapshot file and logs
//! everything the session reports.
//!
//! ## Usage
//!
//! ```bash
//! tether-probe bootstrap.json
//!
//! # With verbose logging
//! RUST_LOG=tether=trace tether-probe bootstrap.json
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tether_client::{
    metrics, GatewayError, RealTimeListener, RealTimeSession, SessionConfig, SessionEvent,
};

struct LogListener;

impl RealTimeListener for LogListener {
    fn on_login_complete(&self) {
        info!("Login complete");
    }

    fn on_error(&self, error: &GatewayError) {
        warn!(%error, "Gateway error");
    }

    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Message(message) => {
                info!(
                    user = message
                        .user
                        .as_ref()
                        .map_or("<unknown>", |u| u.name.as_str()),
                    text = message.message.text.as_deref().unwrap_or(""),
                    "Message"
                );
            }
            _ => info!("Event"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .context("Usage: tether-probe <bootstrap.json>")?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read bootstrap file {path}"))?;
    let bootstrap =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {path}"))?;

    let config = SessionConfig::load()?;
    metrics::init_metrics();

    let session = RealTimeSession::connect(&bootstrap, &config).await?;
    session.add_listener(Arc::new(LogListener));
    info!("Session started, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    session.close().await;
    info!("Session closed");

    Ok(())
}
