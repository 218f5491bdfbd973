pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod providers;
pub mod store;

pub use config::Config;
pub use error::RelayError;

use std::sync::Arc;

/// Shared application state passed to all API handlers.
pub struct AppState {
    pub config: Config,
    pub store: store::TokenStore,
    pub provider: Box<dyn providers::OAuthProvider>,
    pub browser: Box<dyn browser::BrowserLauncher>,
}

pub type SharedState = Arc<AppState>;
