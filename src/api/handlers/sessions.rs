//! Session introspection endpoint.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ErrorResponse;
use crate::api::identity::{Session, User};
use crate::api::session::AuthContext;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub session: Session,
    pub user: User,
}

#[utoipa::path(
    get,
    path = "/api/sessions/me",
    responses(
        (status = 200, description = "Current session and user", body = SessionResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "sessions"
)]
pub async fn me(Extension(context): Extension<AuthContext>) -> impl IntoResponse {
    // The resolver guarantees both halves or neither; reject on neither.
    let Some((user, session)) = context.as_pair() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::unauthorized()),
        )
            .into_response();
    };

    let response = SessionResponse {
        session: session.clone(),
        user: user.clone(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::identity::ProviderSession;
    use axum::body::to_bytes;

    fn resolved() -> ProviderSession {
        ProviderSession {
            user: User {
                id: "uid".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                email_verified: true,
                image: None,
                created_at: "2025-01-01T00:00:00Z".to_string(),
                updated_at: "2025-01-01T00:00:00Z".to_string(),
            },
            session: Session {
                id: "sid".to_string(),
                expires_at: "2025-01-08T00:00:00Z".to_string(),
                token: "tok".to_string(),
                created_at: "2025-01-01T00:00:00Z".to_string(),
                updated_at: "2025-01-01T00:00:00Z".to_string(),
                ip_address: None,
                user_agent: None,
                user_id: "uid".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn me_rejects_anonymous_context() {
        let response = me(Extension(AuthContext::anonymous())).await.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            value.get("error").and_then(serde_json::Value::as_str),
            Some("Unauthorized")
        );
    }

    #[tokio::test]
    async fn me_returns_provider_pair() {
        let context = AuthContext::authenticated(resolved());
        let response = me(Extension(context)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            value.pointer("/user/email").and_then(serde_json::Value::as_str),
            Some("alice@example.com")
        );
        assert_eq!(
            value.pointer("/session/userId").and_then(serde_json::Value::as_str),
            Some("uid")
        );
    }
}
