//! HTTP surface of the proxy
//!
//! Routes each resource endpoint through the [`CacheCoordinator`] and encodes
//! the outcome as JSON. Failures always map to HTTP 500 with a fixed message;
//! upstream error detail is logged, never returned.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::cache::{CacheCoordinator, CacheError};
use crate::resource::Resource;

/// How successful responses are shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseStyle {
    /// `{"data": <value>}`
    #[default]
    Envelope,
    /// The upstream value as-is
    Raw,
}

/// Uniform JSON envelope for API responses
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn data(value: Value) -> Self {
        Self {
            data: Some(value),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body of an API response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Envelope(ApiResponse),
    Raw(Value),
}

/// Turns a coordinator result into a status code and JSON body
pub fn encode(
    resource: Resource,
    result: Result<Value, CacheError>,
    style: ResponseStyle,
) -> (StatusCode, Json<ResponseBody>) {
    match result {
        Ok(value) => {
            let body = match style {
                ResponseStyle::Envelope => ResponseBody::Envelope(ApiResponse::data(value)),
                ResponseStyle::Raw => ResponseBody::Raw(value),
            };
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            error!(resource = resource.key(), error = %e, "Request failed");
            let body = ResponseBody::Envelope(ApiResponse::error(resource.failure_message()));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheCoordinator>,
    pub style: ResponseStyle,
}

impl AppState {
    pub fn new(cache: Arc<CacheCoordinator>, style: ResponseStyle) -> Self {
        Self { cache, style }
    }

    async fn respond(&self, resource: Resource) -> (StatusCode, Json<ResponseBody>) {
        let result = self.cache.get(resource).await;
        encode(resource, result, self.style)
    }
}

async fn latest_rates(State(state): State<AppState>) -> (StatusCode, Json<ResponseBody>) {
    state.respond(Resource::Rates).await
}

async fn currencies(State(state): State<AppState>) -> (StatusCode, Json<ResponseBody>) {
    state.respond(Resource::Currencies).await
}

async fn health() -> &'static str {
    "OK"
}

/// Builds the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(Resource::Rates.route(), get(latest_rates))
        .route(Resource::Currencies.route(), get(currencies))
        .route("/health", get(health))
        .with_state(state)
}

/// Serves the router on `listener` until Ctrl-C
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use serde_json::json;

    fn to_json(Json(body): Json<ResponseBody>) -> Value {
        serde_json::to_value(body).expect("Body should serialize")
    }

    #[test]
    fn test_success_is_wrapped_in_data() {
        let (status, body) = encode(
            Resource::Rates,
            Ok(json!({"rates": {"EUR": 0.92}})),
            ResponseStyle::Envelope,
        );
        let body = to_json(body);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"data": {"rates": {"EUR": 0.92}}}));
    }

    #[test]
    fn test_raw_style_emits_value_directly() {
        let (status, body) = encode(
            Resource::Currencies,
            Ok(json!({"USD": "US Dollar"})),
            ResponseStyle::Raw,
        );
        let body = to_json(body);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"USD": "US Dollar"}));
    }

    #[test]
    fn test_failure_uses_fixed_message() {
        let err = CacheError::Fetch(FetchError::Status(503));
        let (status, body) = encode(Resource::Rates, Err(err), ResponseStyle::Envelope);
        let body = to_json(body);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch exchange rates"}));
    }

    #[test]
    fn test_failure_shape_is_same_for_raw_style() {
        let err = CacheError::Fetch(FetchError::Status(404));
        let (status, body) = encode(Resource::Currencies, Err(err), ResponseStyle::Raw);
        let body = to_json(body);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch currency list"}));
        assert!(!body.to_string().contains("404"));
    }

    #[test]
    fn test_null_data_is_kept() {
        let (_, body) = encode(Resource::Rates, Ok(Value::Null), ResponseStyle::Envelope);
        let body = to_json(body);
        assert_eq!(body, json!({"data": null}));
    }
}
