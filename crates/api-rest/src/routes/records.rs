//! Saved visit records of the authenticated user.

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, AuthUser};
use api_shared::{DeleteRes, PatientsRes, RecordDto, RecordsQuery, RecordsRes};
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use cellcount_core::{RecordId, RecordStore};
use cellcount_export::{records_to_csv, render_report_pdf, report_filename};

const CSV_FILENAME: &str = "cell_counts.csv";

fn parse_id(id: &str) -> ApiResult<RecordId> {
    id.parse()
        .map_err(|e: cellcount_uuid::UuidError| ApiError::BadRequest(e.to_string()))
}

#[utoipa::path(
    get,
    path = "/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Saved records, newest first", body = RecordsRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes),
        (status = 500, description = "Records could not be read", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RecordsQuery>,
) -> ApiResult<Json<RecordsRes>> {
    let store = state.store_for(&user.username)?;
    let filter = query
        .patient_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let records = store
        .list(filter)?
        .iter()
        .rev()
        .map(RecordDto::from)
        .collect();
    Ok(Json(RecordsRes { records }))
}

#[utoipa::path(
    get,
    path = "/records/patients",
    responses(
        (status = 200, description = "Distinct patient identifiers with saved records", body = PatientsRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<PatientsRes>> {
    let store = state.store_for(&user.username)?;
    Ok(Json(PatientsRes {
        patient_ids: store.patient_ids()?,
    }))
}

#[utoipa::path(
    get,
    path = "/records/export.csv",
    responses(
        (status = 200, description = "All saved records as CSV", content_type = "text/csv", body = String),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let store = state.store_for(&user.username)?;
    let bytes = records_to_csv(&store.list(None)?)?;
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILENAME}\""),
            ),
        ],
        bytes,
    ))
}

#[utoipa::path(
    get,
    path = "/records/{id}/report.pdf",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Printable report", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Malformed record id", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes),
        (status = 404, description = "No such record", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn record_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let store = state.store_for(&user.username)?;
    let record = store
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("record {id} not found")))?;

    let bytes = render_report_pdf(&record)?;
    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report_filename(&record)),
            ),
        ],
        bytes,
    ))
}

#[utoipa::path(
    delete,
    path = "/records/{id}",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record deleted", body = DeleteRes),
        (status = 400, description = "Malformed record id", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes),
        (status = 404, description = "No such record", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteRes>> {
    let id = parse_id(&id)?;
    let store = state.store_for(&user.username)?;
    if !store.delete(&id)? {
        return Err(ApiError::NotFound(format!("record {id} not found")));
    }
    Ok(Json(DeleteRes { deleted: true }))
}
