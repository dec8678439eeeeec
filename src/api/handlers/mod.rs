//! HTTP handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod auth;
pub mod health;
pub mod samples;
pub mod sessions;
pub mod ui;

/// JSON error body shared by every route.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new("Not found")
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new("Unauthorized")
    }
}
