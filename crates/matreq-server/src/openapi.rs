use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "matreq API",
        version = "0.1.0",
        description = "Material-request tracking across construction sites."
    ),
    paths(
        crate::routes::users::create_user,
        crate::routes::users::login,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        crate::routes::sites::create_site,
        crate::routes::sites::list_sites,
        crate::routes::sites::get_site,
        crate::routes::sites::update_site,
        crate::routes::sites::delete_site,
        crate::routes::requests::create_request,
        crate::routes::requests::list_requests,
        crate::routes::requests::get_request,
        crate::routes::requests::update_request,
        crate::routes::requests::delete_request,
        crate::routes::system::health,
    ),
    components(schemas(
        crate::dto::CreateUserRequest,
        crate::dto::LoginRequest,
        crate::dto::UpdateUserRequest,
        crate::dto::UserResponse,
        crate::dto::SupervisorAssignmentRequest,
        crate::dto::PurchaserAssignmentRequest,
        crate::dto::CreateSiteRequest,
        crate::dto::UpdateSiteRequest,
        crate::dto::SupervisorResponse,
        crate::dto::PurchaserResponse,
        crate::dto::SiteResponse,
        crate::dto::SiteSummaryResponse,
        crate::dto::DepartmentCardRequest,
        crate::dto::HistoryEntryRequest,
        crate::dto::CreateRequestBody,
        crate::dto::UpdateRequestBody,
        crate::dto::DepartmentCardResponse,
        crate::dto::HistoryEntryResponse,
        crate::dto::RequestResponse,
        crate::dto::HealthResponse,
    )),
    tags(
        (name = "users", description = "User accounts and login"),
        (name = "sites", description = "Construction sites and crew assignments"),
        (name = "requests", description = "Material requests and department workflow"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "JWT issued by POST /api/v1/user/login. Signed with MATREQ_JWT_SECRET.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
