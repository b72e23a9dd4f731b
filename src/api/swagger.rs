use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Career Service API",
        version = "1.0.0",
        description = "Backend for the career-preparation platform. \n\n**Authentication:** protected endpoints expect a Firebase ID token as `Authorization: Bearer <token>`.\n\n**Features:**\n- Job board with periodic ingestion\n- Profile, resume and wishlist management\n- AI mock interviews and soft-skills analysis\n- Job readiness roadmaps\n- Achievements"
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Auth
        crate::api::auth::verify,
        crate::api::auth::get_profile,
        crate::api::auth::update_profile,

        // Jobs
        crate::api::jobs::post_job,
        crate::api::jobs::list_jobs,
        crate::api::jobs::search_jobs,
        crate::api::jobs::get_job,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::models::UserSummary,
            crate::models::UpdateProfileRequest,
            crate::models::CreateJobRequest,
            crate::models::JobResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service and database liveness."),
        (name = "Auth", description = "Firebase-backed user verification and profile endpoints."),
        (name = "Jobs", description = "Job board: posting, listing, search and lookup."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Firebase ID token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/api/jobs/{id}"));
        assert!(doc.paths.paths.contains_key("/api/auth/profile"));
    }
}
