use axum::{http::StatusCode, middleware::from_fn, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::models::{RepositoryError, ServiceError};
use crate::observability::observability_middleware;

pub mod cart;
pub mod catalogue;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod user;

pub use health::*;
pub use metrics::*;
pub use middleware::*;

/// Mount a service router next to `/health` and `/metrics` and wrap it in
/// the shared middleware stack.
pub fn create_app(service_router: Router, monitoring: MonitoringState, request_timeout: Duration) -> Router {
    let metrics_for_middleware = monitoring.metrics.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(monitoring)
        .merge(service_router)
        // Outermost last
        .layer(TimeoutLayer::new(request_timeout))
        .layer(from_fn(cors_middleware))
        .layer(from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}

/// Map a service error to its HTTP status and JSON error body
pub fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match &err {
        ServiceError::ValidationError { message } => (StatusCode::BAD_REQUEST, message.clone()),
        ServiceError::UserAlreadyExists { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::CartNotFound { .. }
        | ServiceError::CartItemNotFound { .. }
        | ServiceError::ProductNotFound { .. }
        | ServiceError::OutOfStock { .. }
        | ServiceError::UserNotFound { .. }
        | ServiceError::IncorrectPassword => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::StoreUnavailable
        | ServiceError::Repository {
            source: RepositoryError::NotConnected { .. },
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "database not available".to_string(),
        ),
        ServiceError::Repository { source } => {
            crate::error_with_trace!(error = %source, "Store operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
