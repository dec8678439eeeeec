//! Router-level tests for session resolution, credential propagation and the
//! sign-in flows.
//!
//! The identity provider is replaced with an in-process mock; the database
//! pool is lazy and never reached by these paths. Each test drives the full
//! router with `tower::ServiceExt::oneshot`.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower::ServiceExt;
use url::Url;

use specimen::api;
use specimen::api::identity::{
    Credentials, IdentityConfig, IdentityProvider, OtpPurpose, ProviderResponse, ProviderSession,
    ProxyRequest, ProxyResponse, Session, User,
};

const SESSION_COOKIE: &str = "specimen.session_token=raw-token";
const ISSUED_COOKIE: &str = "specimen.session_token=issued; Path=/; HttpOnly; SameSite=Lax";

fn resolved_session() -> ProviderSession {
    ProviderSession {
        user: User {
            id: "0191a8b0-0000-7000-8000-000000000001".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            email_verified: true,
            image: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        },
        session: Session {
            id: "0191a8b0-0000-7000-8000-000000000002".to_string(),
            expires_at: "2025-01-08T00:00:00Z".to_string(),
            token: "raw-token".to_string(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
            ip_address: None,
            user_agent: None,
            user_id: "0191a8b0-0000-7000-8000-000000000001".to_string(),
        },
    }
}

/// Scriptable in-process identity provider.
#[derive(Default)]
struct MockProvider {
    session: Option<ProviderSession>,
    resolve_fails: bool,
    sign_in_cookie: Option<String>,
    sign_in_error: Option<String>,
    send_otp_error: Option<String>,
    verify_cookie: Option<String>,
    verify_error: Option<String>,
    sign_out_fails: bool,
    sign_up_calls: AtomicUsize,
}

impl MockProvider {
    fn with_session(mut self) -> Self {
        self.session = Some(resolved_session());
        self
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn resolve_session(&self, _credentials: &Credentials) -> Result<Option<ProviderSession>> {
        if self.resolve_fails {
            anyhow::bail!("provider unreachable");
        }
        Ok(self.session.clone())
    }

    async fn sign_in_password(
        &self,
        _email: &str,
        _password: &str,
        _credentials: &Credentials,
    ) -> Result<ProviderResponse> {
        if let Some(message) = &self.sign_in_error {
            anyhow::bail!("{message}");
        }
        Ok(ProviderResponse {
            status: 200,
            set_cookie: self.sign_in_cookie.clone(),
            body: serde_json::Value::Null,
        })
    }

    async fn sign_up_password(
        &self,
        _name: &str,
        _email: &str,
        _password: &str,
        _credentials: &Credentials,
    ) -> Result<ProviderResponse> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderResponse {
            status: 200,
            set_cookie: self.sign_in_cookie.clone(),
            body: serde_json::Value::Null,
        })
    }

    async fn sign_out(&self, _credentials: &Credentials) -> Result<()> {
        if self.sign_out_fails {
            anyhow::bail!("sign-out rejected");
        }
        Ok(())
    }

    async fn send_otp(&self, _email: &str, _purpose: OtpPurpose) -> Result<()> {
        if let Some(message) = &self.send_otp_error {
            anyhow::bail!("{message}");
        }
        Ok(())
    }

    async fn verify_otp(
        &self,
        _email: &str,
        _code: &str,
        _credentials: &Credentials,
    ) -> Result<ProviderResponse> {
        if let Some(message) = &self.verify_error {
            anyhow::bail!("{message}");
        }
        Ok(ProviderResponse {
            status: 200,
            set_cookie: self.verify_cookie.clone(),
            body: serde_json::Value::Null,
        })
    }

    async fn proxy(&self, _request: ProxyRequest) -> Result<ProxyResponse> {
        Ok(ProxyResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            set_cookie: None,
            body: b"{}".to_vec(),
        })
    }
}

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://postgres@localhost/postgres")
        .expect("lazy pool")
}

fn app(provider: MockProvider) -> (axum::Router, Arc<MockProvider>) {
    let provider = Arc::new(provider);
    let config = IdentityConfig::new(Url::parse("http://localhost:3001").expect("url"));
    let router = api::router(
        lazy_pool(),
        provider.clone() as Arc<dyn IdentityProvider>,
        config,
    );
    (router, provider)
}

async fn body_json(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn body_string(response: axum::response::Response) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn root_greets() -> Result<()> {
    let (router, _) = app(MockProvider::default());
    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn session_me_without_credentials_is_unauthorized() -> Result<()> {
    let (router, _) = app(MockProvider::default().with_session());
    let response = router
        .oneshot(Request::builder().uri("/api/sessions/me").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let value = body_json(response).await?;
    assert_eq!(
        value.get("error").and_then(serde_json::Value::as_str),
        Some("Unauthorized")
    );
    Ok(())
}

#[tokio::test]
async fn session_me_with_valid_credential_returns_pair() -> Result<()> {
    let (router, _) = app(MockProvider::default().with_session());
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/sessions/me")
                .header(COOKIE, SESSION_COOKIE)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await?;
    assert_eq!(
        value
            .pointer("/user/email")
            .and_then(serde_json::Value::as_str),
        Some("alice@example.com")
    );
    assert_eq!(
        value
            .pointer("/session/token")
            .and_then(serde_json::Value::as_str),
        Some("raw-token")
    );
    Ok(())
}

#[tokio::test]
async fn session_me_with_rejected_credential_is_unauthorized() -> Result<()> {
    // Provider knows no session for the presented cookie.
    let (router, _) = app(MockProvider::default());
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/sessions/me")
                .header(COOKIE, "specimen.session_token=garbage")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn resolver_treats_provider_failure_as_anonymous() -> Result<()> {
    let provider = MockProvider {
        resolve_fails: true,
        ..MockProvider::default()
    };
    let (router, _) = app(provider);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/sessions/me")
                .header(COOKIE, SESSION_COOKIE)
                .body(Body::empty())?,
        )
        .await?;
    // Never a 5xx: the resolver degrades to the anonymous context.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn create_sample_requires_authentication() -> Result<()> {
    let (router, _) = app(MockProvider::default());
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/samples")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"hello"}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn create_sample_rejects_empty_text() -> Result<()> {
    let (router, _) = app(MockProvider::default().with_session());
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/samples")
                .header(COOKIE, SESSION_COOKIE)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":""}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn get_sample_rejects_malformed_id() -> Result<()> {
    let (router, _) = app(MockProvider::default());
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/samples/not-a-uuid")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn sign_in_propagates_session_cookie_to_redirect() -> Result<()> {
    let provider = MockProvider {
        sign_in_cookie: Some(ISSUED_COOKIE.to_string()),
        ..MockProvider::default()
    };
    let (router, _) = app(provider);
    let response = router
        .oneshot(form_post(
            "/ui/signin",
            "email=alice%40example.com&password=secret",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/ui")
    );
    assert_eq!(
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok()),
        Some(ISSUED_COOKIE)
    );
    Ok(())
}

#[tokio::test]
async fn sign_in_without_issued_cookie_redirects_bare() -> Result<()> {
    let (router, _) = app(MockProvider::default());
    let response = router
        .oneshot(form_post(
            "/ui/signin",
            "email=alice%40example.com&password=secret",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().get(SET_COOKIE).is_none());
    Ok(())
}

#[tokio::test]
async fn sign_in_failure_redirects_with_inline_error() -> Result<()> {
    let provider = MockProvider {
        sign_in_error: Some("Invalid email or password".to_string()),
        ..MockProvider::default()
    };
    let (router, _) = app(provider);
    let response = router
        .oneshot(form_post(
            "/ui/signin",
            "email=alice%40example.com&password=wrong",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, "/ui/signin?error=Invalid+email+or+password");
    Ok(())
}

#[tokio::test]
async fn sign_up_mismatched_confirmation_never_reaches_provider() -> Result<()> {
    let (router, provider) = app(MockProvider::default());
    let response = router
        .oneshot(form_post(
            "/ui/signup",
            "name=Alice&email=alice%40example.com&password=one&confirm_password=two",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("/ui/signup?error="));
    assert_eq!(provider.sign_up_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn sign_up_propagates_session_cookie() -> Result<()> {
    let provider = MockProvider {
        sign_in_cookie: Some(ISSUED_COOKIE.to_string()),
        ..MockProvider::default()
    };
    let (router, provider) = app(provider);
    let response = router
        .oneshot(form_post(
            "/ui/signup",
            "name=Alice&email=alice%40example.com&password=one&confirm_password=one",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok()),
        Some(ISSUED_COOKIE)
    );
    assert_eq!(provider.sign_up_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn sign_out_clears_cookie_even_when_provider_fails() -> Result<()> {
    let provider = MockProvider {
        sign_out_fails: true,
        ..MockProvider::default()
    }
    .with_session();
    let (router, _) = app(provider);
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ui/signout")
                .header(COOKIE, SESSION_COOKIE)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("specimen.session_token=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn otp_send_renders_code_step_with_hidden_email() -> Result<()> {
    let (router, _) = app(MockProvider::default());
    let response = router
        .oneshot(form_post(
            "/ui/otp-signin",
            "action=send-otp&email=bob%40example.com",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await?;
    assert!(page.contains(r#"value="verify-otp""#));
    assert!(page.contains(r#"<input type="hidden" name="email" value="bob@example.com">"#));
    Ok(())
}

#[tokio::test]
async fn otp_send_failure_stays_on_email_step() -> Result<()> {
    let provider = MockProvider {
        send_otp_error: Some("User not found".to_string()),
        ..MockProvider::default()
    };
    let (router, _) = app(provider);
    let response = router
        .oneshot(form_post(
            "/ui/otp-signin",
            "action=send-otp&email=bob%40example.com",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await?;
    assert!(page.contains(r#"value="send-otp""#));
    assert!(page.contains("User not found"));
    assert!(page.contains(r#"value="bob@example.com""#));
    Ok(())
}

#[tokio::test]
async fn otp_verify_failure_keeps_email_and_allows_retry() -> Result<()> {
    let provider = MockProvider {
        verify_error: Some("Invalid code".to_string()),
        ..MockProvider::default()
    };
    let (router, _) = app(provider);
    let response = router
        .oneshot(form_post(
            "/ui/otp-signin",
            "action=verify-otp&email=bob%40example.com&otp=000000",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await?;
    assert!(page.contains(r#"value="verify-otp""#));
    assert!(page.contains("Invalid code"));
    assert!(page.contains(r#"<input type="hidden" name="email" value="bob@example.com">"#));
    Ok(())
}

#[tokio::test]
async fn otp_verify_success_propagates_cookie_and_redirects() -> Result<()> {
    let provider = MockProvider {
        verify_cookie: Some(ISSUED_COOKIE.to_string()),
        ..MockProvider::default()
    };
    let (router, _) = app(provider);
    let response = router
        .oneshot(form_post(
            "/ui/otp-signin",
            "action=verify-otp&email=bob%40example.com&otp=123456",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/ui")
    );
    assert_eq!(
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok()),
        Some(ISSUED_COOKIE)
    );
    Ok(())
}

#[tokio::test]
async fn home_page_reflects_authentication_state() -> Result<()> {
    let (router, _) = app(MockProvider::default().with_session());
    let response = router
        .oneshot(
            Request::builder()
                .uri("/ui")
                .header(COOKIE, SESSION_COOKIE)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await?;
    assert!(page.contains("alice@example.com"));
    assert!(page.contains("Sign out"));
    Ok(())
}

#[tokio::test]
async fn health_carries_app_header_without_touching_the_provider() -> Result<()> {
    // /health sits outside the session middleware; only the database matters.
    let provider = MockProvider {
        resolve_fails: true,
        ..MockProvider::default()
    };
    let (router, _) = app(provider);
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert!(matches!(
        response.status(),
        StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE
    ));
    assert!(response.headers().get("x-app").is_some());
    Ok(())
}

#[tokio::test]
async fn auth_passthrough_relays_provider_response() -> Result<()> {
    let (router, _) = app(MockProvider::default());
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/auth/get-session")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );
    Ok(())
}
