use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{Cart, ServiceError, ShippingRequest};
use crate::services::CartService;

use super::service_error_to_response;

type HandlerResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// State for cart handlers
#[derive(Clone)]
pub struct CartState {
    pub cart_service: Arc<CartService>,
}

/// Create the cart router
pub fn create_cart_router(cart_service: Arc<CartService>) -> Router {
    let state = CartState { cart_service };

    Router::new()
        .route("/cart/:id", get(get_cart).delete(delete_cart))
        .route("/add/:id/:sku/:qty", get(add_item))
        .route("/update/:id/:sku/:qty", get(update_item))
        .route("/rename/:from/:to", get(rename_cart))
        .route("/shipping/:id", post(add_shipping))
        .with_state(state)
}

#[instrument(name = "get_cart", skip(state))]
pub async fn get_cart(
    State(state): State<CartState>,
    Path(id): Path<String>,
) -> HandlerResult<Json<Cart>> {
    state
        .cart_service
        .get_cart(&id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "delete_cart", skip(state))]
pub async fn delete_cart(
    State(state): State<CartState>,
    Path(id): Path<String>,
) -> HandlerResult<&'static str> {
    state
        .cart_service
        .delete_cart(&id)
        .await
        .map(|()| "OK")
        .map_err(service_error_to_response)
}

#[instrument(name = "add_item", skip(state))]
pub async fn add_item(
    State(state): State<CartState>,
    Path((id, sku, qty)): Path<(String, String, String)>,
) -> HandlerResult<Json<Cart>> {
    state
        .cart_service
        .add_item(&id, &sku, &qty)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "update_item", skip(state))]
pub async fn update_item(
    State(state): State<CartState>,
    Path((id, sku, qty)): Path<(String, String, String)>,
) -> HandlerResult<Json<Cart>> {
    state
        .cart_service
        .update_item(&id, &sku, &qty)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "rename_cart", skip(state))]
pub async fn rename_cart(
    State(state): State<CartState>,
    Path((from, to)): Path<(String, String)>,
) -> HandlerResult<Json<Cart>> {
    state
        .cart_service
        .rename_cart(&from, &to)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "add_shipping", skip(state, payload))]
pub async fn add_shipping(
    State(state): State<CartState>,
    Path(id): Path<String>,
    payload: Result<Json<ShippingRequest>, JsonRejection>,
) -> HandlerResult<Json<Cart>> {
    let Json(request) = payload.map_err(|_| {
        service_error_to_response(ServiceError::ValidationError {
            message: "shipping data missing".to_string(),
        })
    })?;

    state
        .cart_service
        .add_shipping(&id, &request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
