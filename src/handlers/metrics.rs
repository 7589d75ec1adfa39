use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, instrument};

use super::MonitoringState;

/// Handler for Prometheus metrics endpoint
#[instrument(name = "metrics_handler", skip(state))]
pub async fn metrics_handler(State(state): State<MonitoringState>) -> Response {
    state.publish_store_state();

    match state.metrics.encode() {
        Ok(metrics_text) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}
