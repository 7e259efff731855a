use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use stickycart::server::{router, AppState};
use stickycart::webhooks::{Dispatcher, LogProcessor};
use stickycart::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stickycart=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let state = AppState {
        config: Arc::new(config),
        http,
        dispatcher: Dispatcher::new(Arc::new(LogProcessor)),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Errors here mean the signal handler could not be installed; nothing
    // useful to do but run without graceful shutdown.
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
