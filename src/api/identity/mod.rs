//! Identity provider collaborator interface.
//!
//! The provider owns credential verification, session issuance and the
//! one-time-code lifecycle. This service only consumes capabilities:
//! resolve a session, sign in/up, sign out, send and verify codes. The
//! credential transport (cookie header or bearer token) is defined by the
//! provider and forwarded verbatim, never parsed here.
//!
//! Sign-in style calls run in response-capturing mode: the provider's
//! response is returned as a [`ProviderResponse`] so the caller can copy the
//! session-issuing `Set-Cookie` header onto its own outward response. A
//! missed copy silently produces an unauthenticated redirect, which is why
//! the capture is explicit rather than mutating a shared response object.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{
    HeaderMap, Method,
    header::{AUTHORIZATION, COOKIE},
};
use std::time::Duration;
use url::Url;

mod http;
pub mod types;

pub use http::HttpIdentityProvider;
pub use types::{ProviderSession, Session, User};

/// Identity provider settings shared by the client and the session handlers.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    base_url: Url,
    cookie_name: String,
    timeout: Duration,
}

impl IdentityConfig {
    /// Default config: 10 second request timeout and the provider's default
    /// session cookie name.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            cookie_name: "specimen.session_token".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_cookie_name(mut self, cookie_name: String) -> Self {
        self.cookie_name = cookie_name;
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Ambient request credentials, forwarded to the provider untouched.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    cookie: Option<String>,
    authorization: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let cookie = headers
            .get(COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self {
            cookie,
            authorization,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookie.is_none() && self.authorization.is_none()
    }

    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

/// Captured provider response for sign-in style calls.
///
/// Only the pieces the caller is allowed to bridge outward are kept: the
/// status, the session-issuing `Set-Cookie` header (if any) and the decoded
/// body. Everything else is discarded.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: u16,
    pub set_cookie: Option<String>,
    pub body: serde_json::Value,
}

/// Purpose of a one-time code request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    SignIn,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignIn => "sign-in",
        }
    }
}

/// Raw request forwarded through the `/api/auth/*` passthrough.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    pub path_and_query: String,
    pub credentials: Credentials,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Raw provider response relayed back to the client.
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub set_cookie: Option<String>,
    pub body: Vec<u8>,
}

/// Capability interface to the identity provider.
///
/// Implementations decide how to reach the provider (HTTP, in-process fake in
/// tests). Failures carry a user-readable message; callers render it inline
/// and never crash on it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve ambient credentials into a `(user, session)` pair.
    ///
    /// `Ok(None)` covers absent, invalid and expired credentials alike.
    async fn resolve_session(&self, credentials: &Credentials) -> Result<Option<ProviderSession>>;

    /// Password sign-in, response-capturing mode.
    async fn sign_in_password(
        &self,
        email: &str,
        password: &str,
        credentials: &Credentials,
    ) -> Result<ProviderResponse>;

    /// Password sign-up, response-capturing mode.
    async fn sign_up_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
        credentials: &Credentials,
    ) -> Result<ProviderResponse>;

    /// Invalidate the presented session. Callers may ignore failures.
    async fn sign_out(&self, credentials: &Credentials) -> Result<()>;

    /// Ask the provider to generate and deliver a one-time code.
    async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<()>;

    /// Verify a one-time code, response-capturing mode.
    async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        credentials: &Credentials,
    ) -> Result<ProviderResponse>;

    /// Forward a raw `/api/auth/*` request to the provider.
    async fn proxy(&self, request: ProxyRequest) -> Result<ProxyResponse>;
}
