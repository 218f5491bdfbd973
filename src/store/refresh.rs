//! Access-token refresh, shared by `GET /refresh` and the background daemon.
//!
//! The daemon is opt-in (`TOKEN_REFRESH_INTERVAL_SECS`). Each tick it
//! refreshes the stored token if it expires within 5 minutes.

use chrono::{Duration, Utc};
use tracing::{debug, error, info};

use super::memory::TokenRecord;
use crate::error::RelayError;
use crate::SharedState;

/// Refresh ahead of expiry by this much.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Exchange the stored refresh token for a new access token and store it.
///
/// The provider call happens outside the store lock. On failure the store
/// is left untouched.
pub async fn refresh_stored_token(state: &SharedState) -> Result<TokenRecord, RelayError> {
    let refresh_token = state
        .store
        .refresh_token()
        .await
        .ok_or(RelayError::RefreshTokenUnavailable)?;

    let tokens = state
        .provider
        .refresh_token(&refresh_token)
        .await
        .map_err(RelayError::UpstreamRefresh)?;

    let record = state.store.apply_refresh(tokens).await;
    info!(
        provider = state.provider.id(),
        expires_at = ?record.expires_at,
        "Access token refreshed"
    );
    Ok(record)
}

/// Start the refresh daemon loop.
pub async fn refresh_daemon(state: SharedState, interval: std::time::Duration) {
    info!("Token refresh daemon started (interval: {}s)", interval.as_secs());

    loop {
        tokio::time::sleep(interval).await;
        refresh_cycle(&state).await;
    }
}

async fn refresh_cycle(state: &SharedState) {
    let record = state.store.snapshot().await;
    if record.refresh_token.is_none() {
        return;
    }
    if !record.expires_within(Duration::minutes(REFRESH_MARGIN_MINUTES), Utc::now()) {
        debug!(expires_at = ?record.expires_at, "Access token still fresh");
        return;
    }

    if let Err(e) = refresh_stored_token(state).await {
        error!("Background refresh failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::NoBrowser;
    use crate::config::{AllowedOrigins, Config};
    use crate::error::ProviderError;
    use crate::providers::{AccessType, OAuthProvider, TokenSet};
    use crate::store::TokenStore;
    use crate::AppState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl OAuthProvider for CountingProvider {
        fn id(&self) -> &str {
            "counting"
        }

        fn consent_url(&self, _access_type: AccessType, _scopes: &[&str]) -> String {
            String::new()
        }

        async fn exchange_code(&self, _code: &str) -> Result<TokenSet, ProviderError> {
            unreachable!("not used by refresh")
        }

        async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Rejected {
                    status: 400,
                    body: "invalid_grant".into(),
                });
            }
            assert_eq!(refresh_token, "R1");
            Ok(TokenSet {
                access_token: "A2".into(),
                refresh_token: None,
                token_type: "Bearer".into(),
                expires_in: Some(3600),
                scope: None,
            })
        }
    }

    fn state_with(fail: bool) -> (SharedState, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = Arc::new(AppState {
            config: Config {
                host: "127.0.0.1".into(),
                port: 0,
                allowed_origins: AllowedOrigins::List(vec![]),
                client_id: "client".into(),
                client_secret: "secret".into(),
                redirect_uri: "http://localhost/oauth2callback".into(),
                open_browser: false,
                refresh_interval: None,
            },
            store: TokenStore::new(),
            provider: Box::new(CountingProvider {
                calls: calls.clone(),
                fail,
            }),
            browser: Box::new(NoBrowser),
        });
        (state, calls)
    }

    fn initial(expires_in: u64) -> TokenSet {
        TokenSet {
            access_token: "A1".into(),
            refresh_token: Some("R1".into()),
            token_type: "Bearer".into(),
            expires_in: Some(expires_in),
            scope: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let (state, calls) = state_with(false);
        let err = refresh_stored_token(&state).await.unwrap_err();
        assert!(matches!(err, RelayError::RefreshTokenUnavailable));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_store_unchanged() {
        let (state, _) = state_with(true);
        state.store.replace(initial(3600)).await;
        let before = state.store.snapshot().await;

        let err = refresh_stored_token(&state).await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamRefresh(_)));
        assert_eq!(state.store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_cycle_skips_fresh_token() {
        let (state, calls) = state_with(false);
        state.store.replace(initial(3600)).await;

        refresh_cycle(&state).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.store.access_token().await.as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_cycle_refreshes_expiring_token() {
        let (state, calls) = state_with(false);
        state.store.replace(initial(60)).await;

        refresh_cycle(&state).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.store.access_token().await.as_deref(), Some("A2"));
        assert_eq!(state.store.refresh_token().await.as_deref(), Some("R1"));
    }
}
