use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use super::handlers::{ErrorResponse, health, samples, sessions};
use crate::api::identity::types::{Session, User};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        samples::list_samples,
        samples::get_sample,
        samples::create_sample,
        samples::update_sample,
        samples::delete_sample,
        sessions::me,
    ),
    components(schemas(
        health::Health,
        samples::types::Sample,
        samples::types::CreateSample,
        samples::types::UpdateSample,
        samples::types::Deleted,
        sessions::SessionResponse,
        ErrorResponse,
        User,
        Session,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "samples", description = "Soft-deletable sample records"),
        (name = "sessions", description = "Session introspection"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
