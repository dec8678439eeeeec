//! HTTP client for the identity provider service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, SET_COOKIE};
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::{
    Credentials, IdentityConfig, IdentityProvider, OtpPurpose, ProviderResponse, ProviderSession,
    ProxyRequest, ProxyResponse,
};

const GET_SESSION_PATH: &str = "/api/auth/get-session";
const SIGN_IN_EMAIL_PATH: &str = "/api/auth/sign-in/email";
const SIGN_UP_EMAIL_PATH: &str = "/api/auth/sign-up/email";
const SIGN_OUT_PATH: &str = "/api/auth/sign-out";
const SEND_OTP_PATH: &str = "/api/auth/email-otp/send-verification-otp";
const SIGN_IN_OTP_PATH: &str = "/api/auth/sign-in/email-otp";

/// Identity provider client backed by `reqwest`.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    config: IdentityConfig,
}

impl HttpIdentityProvider {
    /// Build the client with the configured timeout.
    ///
    /// Redirects are never followed: a provider redirect is part of the
    /// captured response, not something to chase.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: IdentityConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build identity provider client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.config
            .base_url()
            .join(path)
            .with_context(|| format!("Invalid identity provider endpoint: {path}"))
    }

    fn with_credentials(
        mut request: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        if let Some(cookie) = credentials.cookie() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(authorization) = credentials.authorization() {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }
        request
    }

    /// Capture a sign-in style response: keep the status, the session cookie
    /// header and the decoded body, fail with the provider's message on
    /// non-success statuses.
    async fn capture(response: reqwest::Response) -> Result<ProviderResponse> {
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(anyhow::anyhow!(failure_message(status, &body)));
        }

        Ok(ProviderResponse {
            status: status.as_u16(),
            set_cookie,
            body,
        })
    }
}

/// Prefer the provider's own `message` field; fall back to the status code.
fn failure_message(status: reqwest::StatusCode, body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Identity provider returned {status}"))
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve_session(&self, credentials: &Credentials) -> Result<Option<ProviderSession>> {
        let url = self.endpoint(GET_SESSION_PATH)?;
        let request = Self::with_credentials(self.client.get(url), credentials);
        let response = request
            .send()
            .await
            .context("Session lookup request failed")?;

        // Invalid or expired credentials are "no session", not an error.
        if !response.status().is_success() {
            return Ok(None);
        }

        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        if body.is_null() {
            return Ok(None);
        }

        match serde_json::from_value::<ProviderSession>(body) {
            Ok(resolved) => Ok(Some(resolved)),
            Err(err) => {
                debug!("Unexpected session payload from identity provider: {err}");
                Ok(None)
            }
        }
    }

    async fn sign_in_password(
        &self,
        email: &str,
        password: &str,
        credentials: &Credentials,
    ) -> Result<ProviderResponse> {
        let url = self.endpoint(SIGN_IN_EMAIL_PATH)?;
        let request = Self::with_credentials(self.client.post(url), credentials);
        let response = request
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Sign-in request failed")?;
        Self::capture(response).await
    }

    async fn sign_up_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
        credentials: &Credentials,
    ) -> Result<ProviderResponse> {
        let url = self.endpoint(SIGN_UP_EMAIL_PATH)?;
        let request = Self::with_credentials(self.client.post(url), credentials);
        let response = request
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .context("Sign-up request failed")?;
        Self::capture(response).await
    }

    async fn sign_out(&self, credentials: &Credentials) -> Result<()> {
        let url = self.endpoint(SIGN_OUT_PATH)?;
        let request = Self::with_credentials(self.client.post(url), credentials);
        let response = request.send().await.context("Sign-out request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(anyhow::anyhow!(failure_message(status, &body)));
        }
        Ok(())
    }

    async fn send_otp(&self, email: &str, purpose: OtpPurpose) -> Result<()> {
        let url = self.endpoint(SEND_OTP_PATH)?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "email": email, "type": purpose.as_str() }))
            .send()
            .await
            .context("One-time code request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(anyhow::anyhow!(failure_message(status, &body)));
        }
        Ok(())
    }

    async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        credentials: &Credentials,
    ) -> Result<ProviderResponse> {
        let url = self.endpoint(SIGN_IN_OTP_PATH)?;
        let request = Self::with_credentials(self.client.post(url), credentials);
        let response = request
            .json(&json!({ "email": email, "otp": code }))
            .send()
            .await
            .context("One-time code verification request failed")?;
        Self::capture(response).await
    }

    async fn proxy(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        let url = self.endpoint(&request.path_and_query)?;
        let mut builder = self.client.request(request.method, url);
        builder = Self::with_credentials(builder, &request.credentials);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .context("Identity provider passthrough request failed")?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .context("Failed to read identity provider response body")?
            .to_vec();

        Ok(ProxyResponse {
            status,
            content_type,
            set_cookie,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IdentityConfig {
        IdentityConfig::new(Url::parse("http://localhost:3001").expect("url"))
    }

    #[test]
    fn endpoint_joins_against_base_url() {
        let provider = HttpIdentityProvider::new(config()).expect("provider");
        let url = provider.endpoint(GET_SESSION_PATH).expect("endpoint");
        assert_eq!(url.as_str(), "http://localhost:3001/api/auth/get-session");
    }

    #[test]
    fn endpoint_keeps_query_string() {
        let provider = HttpIdentityProvider::new(config()).expect("provider");
        let url = provider
            .endpoint("/api/auth/callback?code=abc")
            .expect("endpoint");
        assert_eq!(
            url.as_str(),
            "http://localhost:3001/api/auth/callback?code=abc"
        );
    }

    #[test]
    fn failure_message_prefers_provider_body() {
        let body = json!({ "message": "Invalid email or password" });
        let message = failure_message(reqwest::StatusCode::UNAUTHORIZED, &body);
        assert_eq!(message, "Invalid email or password");
    }

    #[test]
    fn failure_message_falls_back_to_status() {
        let message = failure_message(reqwest::StatusCode::BAD_GATEWAY, &Value::Null);
        assert!(message.contains("502"));
    }
}
