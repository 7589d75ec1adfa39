use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::models::Product;
use crate::services::CatalogueService;

use super::service_error_to_response;

type HandlerResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// State for catalogue handlers
#[derive(Clone)]
pub struct CatalogueState {
    pub catalogue_service: Arc<CatalogueService>,
}

/// Create the catalogue router
pub fn create_catalogue_router(catalogue_service: Arc<CatalogueService>) -> Router {
    let state = CatalogueState { catalogue_service };

    Router::new()
        .route("/products", get(list_products))
        .route("/product/:sku", get(get_product))
        .route("/products/:cat", get(products_in_category))
        .route("/categories", get(list_categories))
        .route("/search/:text", get(search_products))
        .with_state(state)
}

#[instrument(name = "list_products", skip(state))]
pub async fn list_products(State(state): State<CatalogueState>) -> HandlerResult<Json<Vec<Product>>> {
    state
        .catalogue_service
        .list_products()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_product", skip(state))]
pub async fn get_product(
    State(state): State<CatalogueState>,
    Path(sku): Path<String>,
) -> HandlerResult<Json<Product>> {
    state
        .catalogue_service
        .get_product(&sku)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "products_in_category", skip(state))]
pub async fn products_in_category(
    State(state): State<CatalogueState>,
    Path(category): Path<String>,
) -> HandlerResult<Json<Vec<Product>>> {
    state
        .catalogue_service
        .products_in_category(&category)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "list_categories", skip(state))]
pub async fn list_categories(State(state): State<CatalogueState>) -> HandlerResult<Json<Vec<String>>> {
    state
        .catalogue_service
        .categories()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "search_products", skip(state))]
pub async fn search_products(
    State(state): State<CatalogueState>,
    Path(text): Path<String>,
) -> HandlerResult<Json<Vec<Product>>> {
    state
        .catalogue_service
        .search(&text)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
