//! Gateway main entry point
//!
//! Serves the token API over HTTP.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_lib::{create_app, AppState, GatewayConfig};
use token_service::{InMemoryCredentialStore, TokenService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may be set directly
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gateway=info,gateway_lib=info,token_service=info,auth=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().context("Invalid gateway configuration")?;
    tracing::info!("Starting Gateway v{}", config.version);
    tracing::info!("Token lifetime: {}", config.jwt.expires_in);

    let store = if config.seed_demo_accounts {
        tracing::info!("Seeding demo accounts: demo, admin");
        InMemoryCredentialStore::with_demo_accounts().context("Failed to seed demo accounts")?
    } else {
        InMemoryCredentialStore::new()
    };

    let tokens = TokenService::new(config.jwt.clone(), Arc::new(store));
    let app = create_app(AppState::new(tokens, config.seed_demo_accounts));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
