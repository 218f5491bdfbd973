//! Route handlers for the token relay.
//!
//! All handlers receive `SharedState` via Axum state extraction. Errors are
//! rendered by `RelayError`'s `IntoResponse`.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::error::RelayError;
use crate::providers::{AccessType, SPREADSHEETS_READONLY_SCOPE};
use crate::store;
use crate::SharedState;

pub const AUTH_STARTED: &str = "Authentication initiated. Please check your browser.";
pub const AUTH_SUCCEEDED: &str =
    "Authentication successful. You can close this window and return to the Figma plugin.";

pub fn router(state: SharedState) -> Router {
    Router::new()
        // ── Health ───────────────────────────────────────────────────────
        .route("/", get(root))
        .route("/status", get(status))
        // ── OAuth flow ───────────────────────────────────────────────────
        .route("/auth", get(auth_start))
        .route("/oauth2callback", get(oauth_callback))
        // ── Tokens ───────────────────────────────────────────────────────
        .route("/token", get(token))
        .route("/refresh", get(refresh))
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn root() -> &'static str {
    "Server working!"
}

async fn status(State(state): State<SharedState>) -> impl IntoResponse {
    let record = state.store.snapshot().await;
    Json(json!({
        "status": "ok",
        "service": "token-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "authenticated": record.access_token.is_some(),
        "expires_at": record.expires_at,
    }))
}

// =============================================================================
// OAuth Flow
// =============================================================================

/// GET /auth — Open the Google consent page in the local browser.
///
/// Returns immediately; the tokens arrive later through /oauth2callback.
async fn auth_start(State(state): State<SharedState>) -> &'static str {
    let url = state
        .provider
        .consent_url(AccessType::Offline, &[SPREADSHEETS_READONLY_SCOPE]);

    info!(provider = state.provider.id(), "Starting consent flow");
    if let Err(e) = state.browser.open(&url) {
        warn!(error = %e, url = %url, "Could not open browser; visit the consent URL manually");
    }

    AUTH_STARTED
}

#[derive(Deserialize)]
struct OAuthCallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

/// GET /oauth2callback — Exchange the authorization code and cache the tokens.
async fn oauth_callback(
    State(state): State<SharedState>,
    Query(q): Query<OAuthCallbackQuery>,
) -> Result<&'static str, RelayError> {
    if let Some(reason) = &q.error {
        warn!(reason = %reason, "Provider returned an error instead of a code");
    }

    let code = q
        .code
        .filter(|c| !c.is_empty())
        .ok_or(RelayError::MissingParameter("Authorization code"))?;

    let tokens = state.provider.exchange_code(&code).await.map_err(|e| {
        error!("Error exchanging code: {e}");
        RelayError::UpstreamExchange(e)
    })?;

    let record = state.store.replace(tokens).await;
    info!(
        has_refresh_token = record.refresh_token.is_some(),
        expires_at = ?record.expires_at,
        "Tokens stored"
    );

    Ok(AUTH_SUCCEEDED)
}

// =============================================================================
// Tokens
// =============================================================================

/// GET /token — Current access token, if any.
async fn token(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, RelayError> {
    let origin = headers.get("origin").and_then(|v| v.to_str().ok());
    debug!(origin = ?origin, "Token requested");

    let token = state
        .store
        .access_token()
        .await
        .ok_or(RelayError::TokenUnavailable)?;

    Ok(Json(json!({ "token": token })))
}

/// GET /refresh — Refresh the access token with the stored refresh token.
async fn refresh(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, RelayError> {
    let record = store::refresh_stored_token(&state).await.map_err(|e| {
        if let RelayError::UpstreamRefresh(_) = &e {
            error!("Error refreshing access token: {e}");
        }
        e
    })?;

    Ok(Json(json!({ "token": record.access_token })))
}
