use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{ListingKind, UserRole};
use crate::handlers;
use crate::models::*;
use crate::utils::GeoCell;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::send_otp,
        handlers::auth::verify_otp,
        handlers::geo::get_cell,
        handlers::geo::get_neighborhood,
        handlers::listing::create_job,
        handlers::listing::list_jobs,
        handlers::listing::delete_job,
        handlers::listing::nearby_jobs,
        handlers::listing::create_service,
        handlers::listing::list_services,
        handlers::listing::delete_service,
        handlers::listing::nearby_services,
    ),
    components(
        schemas(
            SignupRequest,
            UserResponse,
            UserRole,
            SendOtpRequest,
            SendOtpResponse,
            VerifyOtpRequest,
            AuthResponse,
            GeoCell,
            CellResponse,
            NeighborhoodResponse,
            ListingKind,
            CreateJobRequest,
            CreateServiceRequest,
            JobResponse,
            ServiceResponse,
            ListingResponse,
            ApiError,
            ApiErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup and email OTP authentication API"),
        (name = "geo", description = "Hexagonal grid indexing API"),
        (name = "listing", description = "Job and service listing API"),
    ),
    info(
        title = "AgriCare Backend API",
        version = "1.0.0",
        description = "AgriCare marketplace REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
