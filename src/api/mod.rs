//! HTTP router for the token relay.
//!
//! - /               — liveness text
//! - /status         — JSON health + auth state
//! - /auth           — start the consent flow
//! - /oauth2callback — provider redirect target
//! - /token          — current access token
//! - /refresh        — refresh and return the access token

pub mod routes;

use crate::config::AllowedOrigins;
use crate::SharedState;
use axum::http::Method;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(list) => AllowOrigin::list(list.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers(Any)
}
