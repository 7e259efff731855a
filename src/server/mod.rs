//! HTTP surface: the router, its handlers, and the error-to-status mapping.
//!
//! Four routes, each with a contractual status set:
//!
//! | Route              | Statuses            |
//! |--------------------|---------------------|
//! | `GET /`            | 200                 |
//! | `GET /auth`        | 302, 400            |
//! | `GET /auth/callback` | 302, 400, 401, 500 |
//! | `POST /webhooks`   | 200, 401            |
//!
//! The webhook route never attaches a JSON layer: the body is taken as raw
//! bytes and only the verified form is ever parsed.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::install::{begin_install, complete_install, InstallError};
use crate::verify::CallbackParams;
use crate::webhooks::{
    Dispatcher, RawDelivery, HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Outbound HTTP client, reused across requests.
    pub http: reqwest::Client,
    /// Webhook dispatcher.
    pub dispatcher: Dispatcher,
}

/// Builds the application router over the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/auth", get(auth_begin))
        .route("/auth/callback", get(auth_callback))
        .route("/webhooks", post(webhooks_receive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A 302 response with a `Location` header.
///
/// Built by hand because the framework's redirect helpers emit 303/307,
/// and the authorize and post-install redirects are contractually 302.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct AuthParams {
    shop: Option<String>,
}

async fn auth_begin(State(state): State<AppState>, Query(params): Query<AuthParams>) -> Response {
    let Some(shop) = params.shop.as_deref().filter(|s| !s.is_empty()) else {
        return bad_request("missing required parameter 'shop'");
    };

    match begin_install(&state.config, shop) {
        Ok(begin) => {
            info!(shop, "install started");
            found(&begin.authorize_url)
        }
        Err(err) => {
            warn!(shop, error = %err, "install rejected");
            bad_request("invalid shop domain")
        }
    }
}

async fn auth_callback(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = CallbackParams::from_pairs(pairs);

    match complete_install(&state.config, &state.http, &params).await {
        Ok(redirect) => found(&redirect.location),
        Err(err) => install_error_response(&err),
    }
}

/// Maps an install failure to its contractual status.
///
/// Bodies stay generic: a 401 must not reveal which check failed or what
/// the expected signature was.
fn install_error_response(err: &InstallError) -> Response {
    match err {
        InstallError::MissingParam { .. }
        | InstallError::InvalidShop { .. }
        | InstallError::InvalidState => {
            warn!(error = %err, "install callback rejected");
            bad_request("invalid install callback")
        }
        InstallError::InvalidSignature(_) => {
            warn!("install callback signature rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response()
        }
        InstallError::TokenExchange { status, .. } => {
            warn!(upstream_status = status, "token exchange failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "install could not be completed" })),
            )
                .into_response()
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn webhooks_receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let raw = RawDelivery::new(
        body.to_vec(),
        header_value(&headers, HEADER_HMAC),
        header_value(&headers, HEADER_TOPIC),
        header_value(&headers, HEADER_SHOP_DOMAIN),
    );

    // Captured before verification consumes the delivery, for the rejection log.
    let topic = raw.topic_header().unwrap_or("<missing>").to_string();

    match raw.verify(state.config.api_secret().as_ref()) {
        Ok(delivery) => {
            info!(topic = delivery.topic_raw(), "webhook accepted");
            state.dispatcher.dispatch(delivery);
            StatusCode::OK.into_response()
        }
        Err(err) => {
            warn!(topic, error = %err, "webhook rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response()
        }
    }
}
