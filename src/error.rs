use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Request-level error type for the relay's handlers.
///
/// The token endpoints answer with JSON, the browser-facing flow endpoints
/// with plain text. Existing clients depend on both shapes.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    // ── Client Errors ───────────────────────────────────────────────────
    #[error("{0} not provided")]
    MissingParameter(&'static str),

    // ── Cache Errors ────────────────────────────────────────────────────
    #[error("Token not available")]
    TokenUnavailable,

    #[error("Refresh token not available")]
    RefreshTokenUnavailable,

    // ── Provider Errors ─────────────────────────────────────────────────
    #[error("Token exchange failed: {0}")]
    UpstreamExchange(#[source] ProviderError),

    #[error("Token refresh failed: {0}")]
    UpstreamRefresh(#[source] ProviderError),
}

/// Failure of a call to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::MissingParameter(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            RelayError::TokenUnavailable | RelayError::RefreshTokenUnavailable => (
                StatusCode::NOT_FOUND,
                axum::Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            RelayError::UpstreamExchange(_) | RelayError::UpstreamRefresh(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
