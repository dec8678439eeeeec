//! Per-request session resolution.
//!
//! Runs before any route logic and turns the ambient request credentials into
//! an [`AuthContext`] stored in the request extensions. The context is
//! request-scoped: never cached, never shared across requests. Resolution
//! never fails the request; handlers decide whether an anonymous context is
//! acceptable.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use super::identity::{Credentials, IdentityProvider, ProviderSession, Session, User};

/// Request-scoped authentication context.
///
/// Holds the `(user, session)` pair as a unit: both present or both absent,
/// never partially populated.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    resolved: Option<ProviderSession>,
}

impl AuthContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self { resolved: None }
    }

    #[must_use]
    pub fn authenticated(resolved: ProviderSession) -> Self {
        Self {
            resolved: Some(resolved),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.resolved.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.resolved.as_ref().map(|resolved| &resolved.user)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.resolved.as_ref().map(|resolved| &resolved.session)
    }

    /// The full pair, or `None` when anonymous.
    #[must_use]
    pub fn as_pair(&self) -> Option<(&User, &Session)> {
        self.resolved
            .as_ref()
            .map(|resolved| (&resolved.user, &resolved.session))
    }
}

/// Middleware resolving the session for every inbound request.
///
/// Absent, invalid or expired credentials and provider errors all yield the
/// anonymous context; the request always proceeds.
pub async fn resolve_session(
    Extension(provider): Extension<Arc<dyn IdentityProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    let credentials = Credentials::from_headers(request.headers());

    let context = if credentials.is_empty() {
        AuthContext::anonymous()
    } else {
        match provider.resolve_session(&credentials).await {
            Ok(Some(resolved)) => AuthContext::authenticated(resolved),
            Ok(None) => AuthContext::anonymous(),
            Err(err) => {
                warn!("Session lookup failed: {err}");
                AuthContext::anonymous()
            }
        }
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}
