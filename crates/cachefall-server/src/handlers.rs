use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use cachefall_cache::KeyValueStore;
use cachefall_storage::{NewUser, StorageError, User};

use crate::server::AppState;
use crate::service::ServiceError;

/// API-level error with an HTTP status and a JSON body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        let body = json!({ "error": error, "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Storage(StorageError::NotFound { id }) => {
                Self::NotFound(format!("user {id} not found"))
            }
            ServiceError::Storage(StorageError::InvalidUser { message }) => {
                Self::BadRequest(message)
            }
            other => {
                tracing::error!(error = %other, "request failed");
                Self::Internal("internal error".into())
            }
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "cachefall",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

// ---- User CRUD ----

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

pub async fn get_user_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .get_user_by_name(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user '{name}' not found")))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let created = state.users.create_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn create_users_bulk(
    State(state): State<AppState>,
    Json(payload): Json<Vec<NewUser>>,
) -> Result<(StatusCode, Json<Vec<User>>), ApiError> {
    let created = state.users.create_users_bulk(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NewUser>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .update_user(id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Cache administration ----

/// Reports connectivity of the master and replica cache tiers.
///
/// The service stays up with a degraded cache, so a down tier is reported
/// in the body rather than via the HTTP status.
pub async fn cache_health(State(state): State<AppState>) -> impl IntoResponse {
    let master_up = state.tiers.master.ping().await.is_ok();
    let (replica, message) = match &state.tiers.replica {
        Some(replica) => {
            if replica.ping().await.is_ok() {
                ("UP", "master and replica are up")
            } else {
                ("DOWN", "master is up, replica has issues")
            }
        }
        None => ("NOT_CONFIGURED", "running without a replica tier"),
    };

    let body = json!({
        "status": if master_up { "UP" } else { "DOWN" },
        "master": if master_up { "UP" } else { "DOWN" },
        "replica": replica,
        "mode": state.tiers.master.store_name(),
        "message": if master_up { message } else { "master cache is unreachable" },
    });
    (StatusCode::OK, Json(body))
}

/// Lists the logical cache names known to the registry.
pub async fn cache_names(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.cache_names())
}

/// Peeks at one cached entry; 404 covers both unknown names and misses.
pub async fn peek_cache(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let cache = state
        .registry
        .cache(&name)
        .map_err(|e| ApiError::NotFound(e.to_string()))?;

    match cache.get(&key).await {
        Some(bytes) => {
            // Cached values are JSON; expose undecodable ones as a string
            let value = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            Ok(Json(value))
        }
        None => Err(ApiError::NotFound(format!(
            "no cached value for '{key}' in cache '{name}'"
        ))),
    }
}

/// Clears one logical cache on both tiers.
pub async fn clear_cache(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let cache = state
        .registry
        .cache(&name)
        .map_err(|e| ApiError::NotFound(e.to_string()))?;
    cache.clear().await;
    Ok(StatusCode::NO_CONTENT)
}
