//! Records owned by the identity provider.
//!
//! These mirror the provider's canonical `User` and `Session` shapes and are
//! treated as opaque, read-only values: timestamps stay strings, nothing is
//! re-validated or re-derived locally.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub expires_at: String,
    pub token: String,
    pub created_at: String,
    pub updated_at: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: String,
}

/// A resolved session: the provider returns user and session together or not
/// at all, never one without the other.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProviderSession {
    pub user: User,
    pub session: Session,
}
