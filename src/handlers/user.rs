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

use crate::models::{AnonymousId, LoginRequest, RegisterRequest, ServiceError, User};
use crate::services::UserService;

use super::service_error_to_response;

type HandlerResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// State for user handlers
#[derive(Clone)]
pub struct UserState {
    pub user_service: Arc<UserService>,
}

/// Create the user router
pub fn create_user_router(user_service: Arc<UserService>) -> Router {
    let state = UserState { user_service };

    Router::new()
        .route("/uniqueid", get(unique_id))
        .route("/check/:id", get(check_user))
        .route("/login", post(login))
        .route("/register", post(register))
        .with_state(state)
}

fn body_missing(_: JsonRejection) -> (StatusCode, Json<Value>) {
    service_error_to_response(ServiceError::ValidationError {
        message: "name or password not supplied".to_string(),
    })
}

#[instrument(name = "unique_id", skip(state))]
pub async fn unique_id(State(state): State<UserState>) -> HandlerResult<Json<AnonymousId>> {
    state
        .user_service
        .unique_id()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "check_user", skip(state))]
pub async fn check_user(
    State(state): State<UserState>,
    Path(id): Path<String>,
) -> HandlerResult<&'static str> {
    state
        .user_service
        .check(&id)
        .await
        .map(|()| "OK")
        .map_err(service_error_to_response)
}

#[instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<UserState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> HandlerResult<Json<User>> {
    let Json(request) = payload.map_err(body_missing)?;

    state
        .user_service
        .login(&request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "register", skip_all)]
pub async fn register(
    State(state): State<UserState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> HandlerResult<&'static str> {
    let Json(request) = payload.map_err(body_missing)?;

    state
        .user_service
        .register(request)
        .await
        .map(|()| "OK")
        .map_err(service_error_to_response)
}
