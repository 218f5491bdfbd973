//! In-memory token store holding the single token record of this process.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::providers::TokenSet;

/// The current token pair plus the metadata Google returned with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Build a record from a provider response received at `now`.
    ///
    /// An `expires_in` too large to represent leaves `expires_at` unset.
    pub fn from_token_set(tokens: TokenSet, now: DateTime<Utc>) -> Self {
        let expires_at = tokens
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl));

        Self {
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
            token_type: Some(tokens.token_type),
            scope: tokens.scope,
            expires_at,
        }
    }

    /// True if the access token has expired or expires within `margin`.
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at.checked_sub_signed(margin).map_or(true, |t| t <= now))
    }
}

/// Single-slot token cache. Every write replaces the whole record.
#[derive(Default)]
pub struct TokenStore {
    record: RwLock<TokenRecord>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current record.
    pub async fn snapshot(&self) -> TokenRecord {
        self.record.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.record.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.record.read().await.refresh_token.clone()
    }

    /// Store the result of an authorization-code exchange.
    pub async fn replace(&self, tokens: TokenSet) -> TokenRecord {
        let next = TokenRecord::from_token_set(tokens, Utc::now());
        *self.record.write().await = next.clone();
        next
    }

    /// Store the result of a refresh.
    ///
    /// Google usually omits `refresh_token` on refresh. In that case the
    /// refresh token already held is kept; a new one replaces it.
    pub async fn apply_refresh(&self, tokens: TokenSet) -> TokenRecord {
        let mut next = TokenRecord::from_token_set(tokens, Utc::now());
        let mut record = self.record.write().await;
        if next.refresh_token.is_none() {
            next.refresh_token = record.refresh_token.take();
        }
        *record = next.clone();
        next
    }
}
