//! Request/response types for the samples API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: String,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateSample {
    pub text: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdateSample {
    pub text: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: "Deleted".to_string(),
        }
    }
}

impl Default for Deleted {
    fn default() -> Self {
        Self::new()
    }
}
