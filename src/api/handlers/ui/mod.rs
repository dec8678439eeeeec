//! HTML sign-in flows.
//!
//! The password and one-time-code flows invoke the identity provider in
//! response-capturing mode. The provider's response is not the response sent
//! to the client, so its session-issuing `Set-Cookie` header has to be copied
//! onto the outward redirect here; this is the only place that bridges the
//! two. Provider failures are rendered inline and never crash a request.

use axum::{
    extract::{Extension, Form, Query},
    http::{
        HeaderMap, HeaderValue,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

use crate::api::identity::{Credentials, IdentityConfig, IdentityProvider, OtpPurpose};
use crate::api::session::AuthContext;

mod views;

use views::OtpStep;

#[derive(Deserialize, Debug)]
pub struct PageQuery {
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SignInForm {
    email: String,
    password: String,
}

#[derive(Deserialize, Debug)]
pub struct SignUpForm {
    name: String,
    email: String,
    password: String,
    confirm_password: String,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OtpAction {
    SendOtp,
    VerifyOtp,
}

#[derive(Deserialize, Debug)]
pub struct OtpForm {
    action: OtpAction,
    email: String,
    otp: Option<String>,
}

/// Redirect carrying the provider's session cookie, when it issued one.
///
/// A missed copy here silently produces an unauthenticated redirect, so the
/// header is taken verbatim from the captured provider response.
fn redirect_with_session(location: &str, set_cookie: Option<&str>) -> Response {
    let mut response = Redirect::to(location).into_response();
    if let Some(value) = set_cookie.and_then(|cookie| HeaderValue::from_str(cookie).ok()) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

fn redirect_with_error(path: &str, message: &str) -> Response {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("error", message)
        .finish();
    Redirect::to(&format!("{path}?{query}")).into_response()
}

fn clear_session_cookie(cookie_name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{cookie_name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
}

pub async fn home(Extension(context): Extension<AuthContext>) -> Html<String> {
    Html(views::home_page(&context))
}

pub async fn sign_in_page(Query(query): Query<PageQuery>) -> Html<String> {
    Html(views::sign_in_page(query.error.as_deref()))
}

pub async fn sign_in(
    Extension(provider): Extension<Arc<dyn IdentityProvider>>,
    headers: HeaderMap,
    Form(form): Form<SignInForm>,
) -> Response {
    let credentials = Credentials::from_headers(&headers);
    match provider
        .sign_in_password(&form.email, &form.password, &credentials)
        .await
    {
        Ok(response) => redirect_with_session("/ui", response.set_cookie.as_deref()),
        Err(err) => redirect_with_error("/ui/signin", &err.to_string()),
    }
}

pub async fn sign_up_page(Query(query): Query<PageQuery>) -> Html<String> {
    Html(views::sign_up_page(query.error.as_deref()))
}

pub async fn sign_up(
    Extension(provider): Extension<Arc<dyn IdentityProvider>>,
    headers: HeaderMap,
    Form(form): Form<SignUpForm>,
) -> Response {
    // Confirmation mismatch is rejected before any provider call.
    if form.password != form.confirm_password {
        return redirect_with_error("/ui/signup", "Passwords do not match");
    }

    let credentials = Credentials::from_headers(&headers);
    match provider
        .sign_up_password(&form.name, &form.email, &form.password, &credentials)
        .await
    {
        Ok(response) => redirect_with_session("/ui", response.set_cookie.as_deref()),
        Err(err) => redirect_with_error("/ui/signup", &err.to_string()),
    }
}

pub async fn sign_out(
    Extension(provider): Extension<Arc<dyn IdentityProvider>>,
    Extension(config): Extension<IdentityConfig>,
    Extension(context): Extension<AuthContext>,
    headers: HeaderMap,
) -> Response {
    if context.is_authenticated() {
        // Best effort: the user-visible goal is "no longer signed in locally",
        // which holds even when the provider call fails.
        if let Err(err) = provider
            .sign_out(&Credentials::from_headers(&headers))
            .await
        {
            debug!("Provider sign-out failed: {err}");
        }
    }

    // Clear the local cookie even if provider invalidation failed, so the
    // client is not stuck presenting a server-invalidated credential.
    let mut response = Redirect::to("/ui").into_response();
    if let Ok(cookie) = clear_session_cookie(config.cookie_name()) {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

pub async fn otp_page(Query(query): Query<PageQuery>) -> Html<String> {
    Html(views::otp_page(&OtpStep::AwaitingEmail {
        email: None,
        error: query.error.as_deref(),
    }))
}

pub async fn otp_submit(
    Extension(provider): Extension<Arc<dyn IdentityProvider>>,
    headers: HeaderMap,
    Form(form): Form<OtpForm>,
) -> Response {
    match form.action {
        OtpAction::SendOtp => send_otp(provider.as_ref(), &form.email).await,
        OtpAction::VerifyOtp => {
            let code = form.otp.as_deref().unwrap_or_default();
            verify_otp(provider.as_ref(), &form.email, code, &headers).await
        }
    }
}

async fn send_otp(provider: &dyn IdentityProvider, email: &str) -> Response {
    // Only presence is checked locally; everything else is the provider's call.
    if email.trim().is_empty() {
        return Html(views::otp_page(&OtpStep::AwaitingEmail {
            email: None,
            error: Some("Enter your email address."),
        }))
        .into_response();
    }

    match provider.send_otp(email, OtpPurpose::SignIn).await {
        Ok(()) => Html(views::otp_page(&OtpStep::AwaitingOtp {
            email,
            notice: Some("A one-time code has been sent to your email."),
            error: None,
        }))
        .into_response(),
        // Stay on the email step; the address is kept so it can be corrected.
        Err(err) => Html(views::otp_page(&OtpStep::AwaitingEmail {
            email: Some(email),
            error: Some(&err.to_string()),
        }))
        .into_response(),
    }
}

async fn verify_otp(
    provider: &dyn IdentityProvider,
    email: &str,
    code: &str,
    headers: &HeaderMap,
) -> Response {
    if code.is_empty() {
        return Html(views::otp_page(&OtpStep::AwaitingOtp {
            email,
            notice: None,
            error: Some("Enter the code from your email."),
        }))
        .into_response();
    }

    let credentials = Credentials::from_headers(headers);
    match provider.verify_otp(email, code, &credentials).await {
        Ok(response) => redirect_with_session("/ui", response.set_cookie.as_deref()),
        // Wrong or expired code: stay on the code step with the same email so
        // the user can retry.
        Err(err) => Html(views::otp_page(&OtpStep::AwaitingOtp {
            email,
            notice: None,
            error: Some(&err.to_string()),
        }))
        .into_response(),
    }
}
