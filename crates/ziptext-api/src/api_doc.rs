//! OpenAPI documentation, served at `/api/openapi.json` and rendered at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use ziptext_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ziptext API",
        version = "0.1.0",
        description = "Upload a ZIP archive of a project and get back a single text document: a tree of its important files followed by the contents of its text files. All project endpoints are versioned under /api/v0/ and require a bearer token."
    ),
    paths(
        handlers::health::health_check,
        handlers::projects::upload_project,
        handlers::projects::list_projects,
        handlers::projects::view_project_text,
        handlers::projects::download_project_text,
        handlers::projects::download_project_archive,
        handlers::projects::delete_project,
    ),
    components(
        schemas(
            models::UploadRecordResponse,
            models::ProjectTextResponse,
            error::ErrorResponse,
            handlers::health::HealthCheckResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "projects", description = "Archive upload, history and downloads"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
