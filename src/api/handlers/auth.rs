//! Raw passthrough to the identity provider's own endpoints.
//!
//! Everything under `/api/auth/*` is the provider's surface, not ours: the
//! request is forwarded with its credentials and body, and the response is
//! relayed with its status, content type and any session cookie.

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Extension, Request},
    http::{
        StatusCode,
        header::{CONTENT_TYPE, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use super::ErrorResponse;
use crate::api::identity::{Credentials, IdentityProvider, ProxyRequest};

/// Forwarded bodies are bounded; the provider's endpoints are small JSON.
const MAX_FORWARD_BODY_BYTES: usize = 1024 * 1024;

pub async fn forward(
    Extension(provider): Extension<Arc<dyn IdentityProvider>>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
    let credentials = Credentials::from_headers(&parts.headers);
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = match to_bytes(body, MAX_FORWARD_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(_) => {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse::new("Request body too large")),
            )
                .into_response();
        }
    };

    let proxied = provider
        .proxy(ProxyRequest {
            method: parts.method,
            path_and_query,
            credentials,
            content_type,
            body,
        })
        .await;

    match proxied {
        Ok(upstream) => {
            let status =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut response = (status, Body::from(upstream.body)).into_response();
            if let Some(content_type) = upstream
                .content_type
                .as_deref()
                .and_then(|value| value.parse().ok())
            {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            if let Some(set_cookie) = upstream
                .set_cookie
                .as_deref()
                .and_then(|value| value.parse().ok())
            {
                response.headers_mut().insert(SET_COOKIE, set_cookie);
            }
            response
        }
        Err(err) => {
            error!("Identity provider passthrough failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("Identity provider unavailable")),
            )
                .into_response()
        }
    }
}
