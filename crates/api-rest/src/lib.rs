//! # API REST
//!
//! REST API for CellCount.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - bearer-token authentication against the user registry
//! - one in-memory counting session per login
//! - OpenAPI/Swagger documentation
//!
//! Uses `api-shared` for request and response bodies.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::{AppState, AuthUser};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use routes::{auth, health, records, reference, session};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register,
        auth::login,
        auth::logout,
        reference::reference_bands_handler,
        session::get_session,
        session::start_panel,
        session::increment,
        session::undo,
        session::reset,
        session::set_patient,
        session::clear_patient,
        session::get_morphology,
        session::set_morphology,
        session::set_comment,
        session::summary,
        session::save,
        records::list_records,
        records::list_patients,
        records::export_csv,
        records::record_report,
        records::delete_record,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::RegisterReq,
        api_shared::RegisterRes,
        api_shared::LoginReq,
        api_shared::LoginRes,
        api_shared::LogoutRes,
        api_shared::BandDto,
        api_shared::ReferenceBandsRes,
        api_shared::CountDto,
        api_shared::PatientDto,
        api_shared::SessionRes,
        api_shared::StartPanelReq,
        api_shared::IncrementReq,
        api_shared::IncrementRes,
        api_shared::UndoRes,
        api_shared::PatientReq,
        api_shared::MorphologyFeatureDto,
        api_shared::MorphologyRes,
        api_shared::MorphologyReq,
        api_shared::CommentReq,
        api_shared::SummaryRowDto,
        api_shared::SummaryRes,
        api_shared::FindingDto,
        api_shared::RecordDto,
        api_shared::SaveRes,
        api_shared::RecordsRes,
        api_shared::PatientsRes,
        api_shared::DeleteRes,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Builds the complete application router.
///
/// `/health`, `/auth/register`, `/auth/login` and `/reference-bands` are public;
/// everything else requires `Authorization: Bearer <token>`.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/reference-bands", get(reference::reference_bands_handler));

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/session", get(session::get_session))
        .route("/session/panel", post(session::start_panel))
        .route("/session/increment", post(session::increment))
        .route("/session/undo", post(session::undo))
        .route("/session/reset", post(session::reset))
        .route(
            "/session/patient",
            axum::routing::put(session::set_patient).delete(session::clear_patient),
        )
        .route(
            "/session/morphology",
            get(session::get_morphology).put(session::set_morphology),
        )
        .route("/session/comment", axum::routing::put(session::set_comment))
        .route("/session/summary", get(session::summary))
        .route("/session/save", post(session::save))
        .route("/records", get(records::list_records))
        .route("/records/patients", get(records::list_patients))
        .route("/records/export.csv", get(records::export_csv))
        .route("/records/:id/report.pdf", get(records::record_report))
        .route("/records/:id", axum::routing::delete(records::delete_record))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
