use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use token_relay::providers::{GoogleProvider, OAuthProvider};
use token_relay::store::{self, TokenStore};
use token_relay::{api, browser, AppState, Config, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_relay=info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;
    info!("token-relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}", config.bind_addr());
    info!("OAuth callback: {}", config.redirect_uri);

    let provider = GoogleProvider::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        config.redirect_uri.clone(),
    );
    info!("Provider {} configured", provider.id());

    // Build shared state
    let state: SharedState = Arc::new(AppState {
        config: config.clone(),
        store: TokenStore::new(),
        provider: Box::new(provider),
        browser: browser::launcher(config.open_browser),
    });

    // Start refresh daemon
    if let Some(interval) = config.refresh_interval {
        let daemon_state = state.clone();
        tokio::spawn(async move {
            store::refresh_daemon(daemon_state, interval).await;
        });
    }

    // Build router
    let app = api::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server working!");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
