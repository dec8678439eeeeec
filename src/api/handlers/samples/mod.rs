//! CRUD endpoints for the soft-deletable samples resource.
//!
//! Reads are public; writes require an authenticated context. Missing and
//! soft-deleted ids are indistinguishable: both answer 404.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::ErrorResponse;
use crate::api::session::AuthContext;

mod storage;
pub mod types;

use types::{CreateSample, Deleted, Sample, UpdateSample};

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::unauthorized()),
    )
        .into_response()
}

fn not_found() -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found())).into_response()
}

#[utoipa::path(
    get,
    path = "/api/samples",
    responses(
        (status = 200, description = "List of samples", body = [Sample])
    ),
    tag = "samples"
)]
pub async fn list_samples(pool: Extension<PgPool>) -> impl IntoResponse {
    match storage::list_samples(&pool).await {
        Ok(samples) => (StatusCode::OK, Json(samples)).into_response(),
        Err(err) => {
            error!("Failed to list samples: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/samples/{id}",
    params(("id" = String, Path, description = "Sample id")),
    responses(
        (status = 200, description = "Sample found", body = Sample),
        (status = 404, description = "Sample not found", body = ErrorResponse)
    ),
    tag = "samples"
)]
pub async fn get_sample(Path(id): Path<Uuid>, pool: Extension<PgPool>) -> impl IntoResponse {
    match storage::get_sample(&pool, id).await {
        Ok(Some(sample)) => (StatusCode::OK, Json(sample)).into_response(),
        Ok(None) => not_found(),
        Err(err) => {
            error!("Failed to fetch sample: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/samples",
    request_body = CreateSample,
    responses(
        (status = 201, description = "Sample created", body = Sample),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "samples"
)]
pub async fn create_sample(
    pool: Extension<PgPool>,
    Extension(context): Extension<AuthContext>,
    payload: Option<Json<CreateSample>>,
) -> impl IntoResponse {
    if !context.is_authenticated() {
        return unauthorized();
    }

    let Some(Json(payload)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Missing payload")),
        )
            .into_response();
    };

    // Validation happens before any store call.
    if payload.text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Text must not be empty")),
        )
            .into_response();
    }

    // UUIDv7: time-sortable, generated here rather than in the database.
    let id = Uuid::now_v7();
    match storage::insert_sample(&pool, id, &payload.text).await {
        Ok(sample) => (StatusCode::CREATED, Json(sample)).into_response(),
        Err(err) => {
            error!("Failed to create sample: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/samples/{id}",
    params(("id" = String, Path, description = "Sample id")),
    request_body = UpdateSample,
    responses(
        (status = 200, description = "Sample updated", body = Sample),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Sample not found", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "samples"
)]
pub async fn update_sample(
    Path(id): Path<Uuid>,
    pool: Extension<PgPool>,
    Extension(context): Extension<AuthContext>,
    payload: Option<Json<UpdateSample>>,
) -> impl IntoResponse {
    if !context.is_authenticated() {
        return unauthorized();
    }

    let Some(Json(payload)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Missing payload")),
        )
            .into_response();
    };

    if payload.text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Text must not be empty")),
        )
            .into_response();
    }

    match storage::update_sample(&pool, id, &payload.text).await {
        Ok(Some(sample)) => (StatusCode::OK, Json(sample)).into_response(),
        Ok(None) => not_found(),
        Err(err) => {
            error!("Failed to update sample: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/samples/{id}",
    params(("id" = String, Path, description = "Sample id")),
    responses(
        (status = 200, description = "Sample deleted", body = Deleted),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Sample not found", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "samples"
)]
pub async fn delete_sample(
    Path(id): Path<Uuid>,
    pool: Extension<PgPool>,
    Extension(context): Extension<AuthContext>,
) -> impl IntoResponse {
    if !context.is_authenticated() {
        return unauthorized();
    }

    match storage::soft_delete_sample(&pool, id).await {
        Ok(true) => (StatusCode::OK, Json(Deleted::new())).into_response(),
        // Already deleted and never existed answer the same way.
        Ok(false) => not_found(),
        Err(err) => {
            error!("Failed to delete sample: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
