use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::traits::{AccessType, OAuthProvider, TokenSet};
use crate::error::ProviderError;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Read-only access to Google Sheets.
pub const SPREADSHEETS_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Google OAuth 2.0 provider.
///
/// Token lifetime: 1 hour.
/// Refresh: Supported (requires `access_type=offline`). Google usually omits
/// `refresh_token` from refresh responses.
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_endpoint: String,
    token_endpoint: String,
    http: reqwest::Client,
}

// Raw token response from Google's token endpoint
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<u64>,
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".into()
}

impl From<GoogleTokenResponse> for TokenSet {
    fn from(resp: GoogleTokenResponse) -> Self {
        TokenSet {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            token_type: resp.token_type,
            expires_in: resp.expires_in,
            scope: resp.scope,
        }
    }
}

impl GoogleProvider {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            redirect_uri,
            AUTH_ENDPOINT.into(),
            TOKEN_ENDPOINT.into(),
        )
    }

    /// Point the provider at non-default endpoints (used against a mock server).
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        auth_endpoint: String,
        token_endpoint: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_endpoint,
            token_endpoint,
            http: reqwest::Client::new(),
        }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet, ProviderError> {
        let resp = self.http.post(&self.token_endpoint).form(form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token_resp: GoogleTokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(token_resp.into())
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn consent_url(&self, access_type: AccessType, scopes: &[&str]) -> String {
        let scope = scopes.join(" ");
        let params = [
            ("access_type", access_type.as_str()),
            ("scope", scope.as_str()),
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        match Url::parse_with_params(&self.auth_endpoint, &params) {
            Ok(url) => url.to_string(),
            // Unparseable endpoint override
            Err(_) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&params)
                    .finish();
                format!("{}?{}", self.auth_endpoint, query)
            }
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, ProviderError> {
        self.token_request(&[
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, ProviderError> {
        self.token_request(&[
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> GoogleProvider {
        GoogleProvider::with_endpoints(
            "client-123".into(),
            "secret-456".into(),
            "http://localhost:3000/oauth2callback".into(),
            format!("{}/auth", server.uri()),
            format!("{}/token", server.uri()),
        )
    }

    #[test]
    fn test_consent_url_parameters() {
        let provider = GoogleProvider::new(
            "client-123".into(),
            "secret-456".into(),
            "http://localhost:3000/oauth2callback".into(),
        );
        let url = provider.consent_url(AccessType::Offline, &[SPREADSHEETS_READONLY_SCOPE]);
        let parsed = Url::parse(&url).unwrap();

        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["scope"], SPREADSHEETS_READONLY_SCOPE);
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["redirect_uri"], "http://localhost:3000/oauth2callback");
        assert!(!pairs.contains_key("client_secret"));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "A1",
                "refresh_token": "R1",
                "token_type": "Bearer",
                "expires_in": 3599,
                "scope": SPREADSHEETS_READONLY_SCOPE,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = provider_for(&server).exchange_code("abc").await.unwrap();
        assert_eq!(tokens.access_token, "A1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("R1"));
        assert_eq!(tokens.expires_in, Some(3599));
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).exchange_code("bad").await.unwrap_err();
        match err {
            ProviderError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider_for(&server).exchange_code("abc").await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_refresh_without_new_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=R1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "A2",
                "expires_in": 3599,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = provider_for(&server).refresh_token("R1").await.unwrap();
        assert_eq!(tokens.access_token, "A2");
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.token_type, "Bearer");
    }
}
