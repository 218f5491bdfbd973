use async_trait::async_trait;

use crate::error::ProviderError;

/// A set of tokens returned from an OAuth provider after code exchange or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

/// `access_type` parameter of the consent URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    /// Ask the provider to issue a refresh token alongside the access token.
    Offline,
}

impl AccessType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessType::Offline => "offline",
        }
    }
}

/// Client side of an OAuth 2.0 authorization-code flow.
///
/// The implementation owns the client credentials and the redirect URI, so
/// callers only deal in codes and tokens.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Unique provider identifier (e.g., "google").
    fn id(&self) -> &str;

    /// Build the consent URL the user agent should be sent to.
    fn consent_url(&self, access_type: AccessType, scopes: &[&str]) -> String;

    /// Exchange an authorization code for an access token (and optionally refresh token).
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, ProviderError>;

    /// Obtain a new access token using a refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, ProviderError>;
}
