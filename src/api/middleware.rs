//! Middleware Components
//!
//! CORS, request tracking, and publisher API-key authentication. Identity
//! itself is an external capability; the middleware only consumes
//! `resolve_api_key` and the active-status check.

use super::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, ExposeHeaders};
use uuid::Uuid;

/// Request ID header key
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// API key header key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Create CORS middleware with configurable origins
pub fn create_cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    if allowed_origins.is_empty() || allowed_origins.contains(&"*".to_string()) {
        // Development mode: allow all origins
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(ExposeHeaders::list([HeaderName::from_static(REQUEST_ID_HEADER)]))
    } else {
        // Production mode: specific origins
        CorsLayer::new()
            .allow_origin(
                allowed_origins
                    .into_iter()
                    .filter_map(|o| o.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers(Any)
            .expose_headers(ExposeHeaders::list([HeaderName::from_static(REQUEST_ID_HEADER)]))
    }
}

/// Middleware to add request ID to all requests
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    // Check if request already has an ID from client
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Request ID wrapper for extracting in handlers
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Authenticated publisher, resolved from the API key by the middleware.
#[derive(Debug, Clone, Copy)]
pub struct AuthedPublisher(pub Uuid);

/// Resolve the caller's API key to an active publisher and attach it to the
/// request. Applied to every `/api/v1` route.
pub async fn publisher_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::unauthorized(request_id.clone(), "API key required".to_string()))?;

    let publisher = state
        .publishers
        .resolve_api_key(&api_key)
        .await
        .map_err(|e| ApiError::from_core(request_id.clone(), e))?
        .ok_or_else(|| {
            log::warn!("Rejected request with unknown API key");
            ApiError::unauthorized(request_id.clone(), "Invalid API key".to_string())
        })?;

    if !state
        .publishers
        .publisher_is_active(publisher.id)
        .await
        .map_err(|e| ApiError::from_core(request_id.clone(), e))?
    {
        return Err(ApiError::forbidden(
            request_id,
            "Publisher account is not active".to_string(),
        ));
    }

    request.extensions_mut().insert(AuthedPublisher(publisher.id));
    Ok(next.run(request).await)
}
