use crate::api;
use crate::api::identity::{HttpIdentityProvider, IdentityConfig, IdentityProvider};
use anyhow::{Context, Result};
use std::sync::Arc;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub identity_url: String,
    pub session_cookie: String,
    pub identity_timeout_seconds: u64,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the identity provider URL is invalid or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let base_url = Url::parse(&args.identity_url)
        .with_context(|| format!("Invalid identity provider URL: {}", args.identity_url))?;

    let config = IdentityConfig::new(base_url)
        .with_cookie_name(args.session_cookie)
        .with_timeout_seconds(args.identity_timeout_seconds);

    let provider: Arc<dyn IdentityProvider> =
        Arc::new(HttpIdentityProvider::new(config.clone())?);

    api::new(args.port, args.dsn, provider, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_rejects_invalid_identity_url() {
        let args = Args {
            port: 0,
            dsn: "postgres://localhost/specimen".to_string(),
            identity_url: "not a url".to_string(),
            session_cookie: "specimen.session_token".to_string(),
            identity_timeout_seconds: 10,
        };
        let result = execute(args).await;
        assert!(result.is_err());
    }
}
