use axum::{extract::State, response::Json};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::instrument;

use crate::observability::Metrics;
use crate::repositories::ConnectionState;

/// State for the health and metrics endpoints
#[derive(Clone)]
pub struct MonitoringState {
    pub metrics: Arc<Metrics>,
    pub stores: Vec<Arc<ConnectionState>>,
}

impl MonitoringState {
    pub fn new(metrics: Arc<Metrics>, stores: Vec<Arc<ConnectionState>>) -> Self {
        Self { metrics, stores }
    }

    /// Copy each store's connectivity into the `store_connected` gauge
    pub fn publish_store_state(&self) {
        for store in &self.stores {
            self.metrics
                .set_store_connected(store.store(), store.is_connected());
        }
    }
}

/// Always 200; reports `{"app": "OK"}` plus one boolean per backing store
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<MonitoringState>) -> Json<Value> {
    let mut body = Map::new();
    body.insert("app".to_string(), Value::from("OK"));
    for store in &state.stores {
        body.insert(store.store().to_string(), Value::from(store.is_connected()));
    }

    Json(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_health_reports_each_store() {
        let redis = Arc::new(ConnectionState::new("redis"));
        let dynamodb = Arc::new(ConnectionState::new("dynamodb"));
        dynamodb.mark_connected();

        let state = MonitoringState::new(
            Arc::new(Metrics::new().unwrap()),
            vec![redis, dynamodb],
        );

        let Json(body) = health_check(State(state)).await;

        assert_eq!(body, json!({"app": "OK", "redis": false, "dynamodb": true}));
    }
}
