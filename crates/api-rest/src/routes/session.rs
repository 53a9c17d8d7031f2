//! Counting session endpoints.
//!
//! Every authenticated token owns one [`CountingSession`], created on first use with
//! the configured default panel.

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, AuthUser};
use api_shared::{
    CommentReq, IncrementReq, IncrementRes, MorphologyReq, MorphologyRes, PatientReq, RecordDto,
    SaveRes, SessionRes, StartPanelReq, SummaryRes, UndoRes,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use cellcount_core::{
    CellType, CountingSession, Gender, MorphologyFeature, Panel, PatientMeta, Severity,
};
use chrono::Utc;

async fn with_session<T>(
    state: &AppState,
    user: &AuthUser,
    f: impl FnOnce(&mut CountingSession) -> T,
) -> T {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .entry(user.token.clone())
        .or_insert_with(|| state.new_session());
    f(session)
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current counting session", body = SessionRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionRes> {
    Json(with_session(&state, &user, |session| SessionRes::from(&*session)).await)
}

#[utoipa::path(
    post,
    path = "/session/panel",
    request_body = StartPanelReq,
    responses(
        (status = 200, description = "New workflow started; counts cleared", body = SessionRes),
        (status = 400, description = "Unknown panel", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Start a workflow with the given panel. Counts and undo history are reset; patient,
/// morphology and comment are kept.
#[axum::debug_handler]
pub async fn start_panel(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<StartPanelReq>,
) -> ApiResult<Json<SessionRes>> {
    let panel: Panel = req.panel.parse()?;
    Ok(Json(
        with_session(&state, &user, |session| {
            session.start_panel(panel);
            SessionRes::from(&*session)
        })
        .await,
    ))
}

#[utoipa::path(
    post,
    path = "/session/increment",
    request_body = IncrementReq,
    responses(
        (status = 200, description = "Cell counted", body = IncrementRes),
        (status = 400, description = "Unknown cell type or not part of the active panel", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Count one cell. `milestone` is set when the total reaches 100 or 200.
#[axum::debug_handler]
pub async fn increment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<IncrementReq>,
) -> ApiResult<Json<IncrementRes>> {
    let cell: CellType = req.cell_type.parse()?;
    let res = with_session(&state, &user, |session| {
        let milestone = session.increment(cell)?;
        Ok::<_, ApiError>(IncrementRes {
            cell_type: cell.name().to_string(),
            count: session.ledger().count(cell),
            total: session.ledger().total(),
            milestone: milestone.map(|m| m.0),
        })
    })
    .await?;

    if let Some(milestone) = res.milestone {
        tracing::info!(username = user.username.as_str(), milestone, "Count milestone reached");
    }
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/session/undo",
    responses(
        (status = 200, description = "Outcome of the undo", body = UndoRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Revert the most recent increment. Undo with nothing to revert is not an error.
#[axum::debug_handler]
pub async fn undo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<UndoRes> {
    Json(
        with_session(&state, &user, |session| {
            let outcome = session.undo();
            UndoRes::new(outcome, session.ledger().total())
        })
        .await,
    )
}

#[utoipa::path(
    post,
    path = "/session/reset",
    responses(
        (status = 200, description = "Counts cleared", body = SessionRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn reset(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionRes> {
    Json(
        with_session(&state, &user, |session| {
            session.reset_counts();
            SessionRes::from(&*session)
        })
        .await,
    )
}

#[utoipa::path(
    put,
    path = "/session/patient",
    request_body = PatientReq,
    responses(
        (status = 200, description = "Patient metadata set", body = SessionRes),
        (status = 400, description = "Malformed birth date or unknown gender", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Set patient identifier, gender and birth date (`DD.MM.YYYY`). Blank fields mean
/// "not provided".
#[axum::debug_handler]
pub async fn set_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PatientReq>,
) -> ApiResult<Json<SessionRes>> {
    let gender: Gender = req.gender.parse()?;
    let meta = PatientMeta::from_input(&req.patient_id, gender, &req.birth_date)?;
    Ok(Json(
        with_session(&state, &user, |session| {
            session.set_patient(meta);
            SessionRes::from(&*session)
        })
        .await,
    ))
}

#[utoipa::path(
    delete,
    path = "/session/patient",
    responses(
        (status = 200, description = "Patient metadata cleared", body = SessionRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn clear_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionRes> {
    Json(
        with_session(&state, &user, |session| {
            session.clear_patient();
            SessionRes::from(&*session)
        })
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/session/morphology",
    responses(
        (status = 200, description = "Grade of every morphology feature", body = MorphologyRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_morphology(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<MorphologyRes> {
    Json(with_session(&state, &user, |session| MorphologyRes::from(session.morphology())).await)
}

#[utoipa::path(
    put,
    path = "/session/morphology",
    request_body = MorphologyReq,
    responses(
        (status = 200, description = "Grades updated", body = MorphologyRes),
        (status = 400, description = "Unknown feature or severity; nothing was changed", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Set severities by feature name. The whole request is rejected if any entry is invalid.
#[axum::debug_handler]
pub async fn set_morphology(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<MorphologyReq>,
) -> ApiResult<Json<MorphologyRes>> {
    let grades = req
        .grades
        .iter()
        .map(|(feature, severity)| {
            Ok((
                feature.parse::<MorphologyFeature>()?,
                severity.parse::<Severity>()?,
            ))
        })
        .collect::<Result<Vec<_>, cellcount_core::CountError>>()?;

    Ok(Json(
        with_session(&state, &user, |session| {
            for (feature, severity) in grades {
                session.set_morphology(feature, severity);
            }
            MorphologyRes::from(session.morphology())
        })
        .await,
    ))
}

#[utoipa::path(
    put,
    path = "/session/comment",
    request_body = CommentReq,
    responses(
        (status = 200, description = "Comment set", body = SessionRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn set_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CommentReq>,
) -> Json<SessionRes> {
    Json(
        with_session(&state, &user, |session| {
            session.set_comment(req.comment);
            SessionRes::from(&*session)
        })
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/session/summary",
    responses(
        (status = 200, description = "Counts classified against the patient's reference bands", body = SummaryRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<SummaryRes> {
    let today = Utc::now().date_naive();
    Json(with_session(&state, &user, |session| SummaryRes::from(&session.summary(today))).await)
}

#[utoipa::path(
    post,
    path = "/session/save",
    responses(
        (status = 201, description = "Visit record saved", body = SaveRes),
        (status = 400, description = "Session data failed validation", body = api_shared::ErrorRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes),
        (status = 500, description = "Record could not be written", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Persist a snapshot of the session. The session keeps its state either way.
#[axum::debug_handler]
pub async fn save(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<(StatusCode, Json<SaveRes>)> {
    let store = state.store_for(&user.username)?;
    let session = with_session(&state, &user, |session| session.clone()).await;
    let record =
        tokio::task::spawn_blocking(move || session.save(&store, Utc::now())).await??;
    Ok((
        StatusCode::CREATED,
        Json(SaveRes {
            record: RecordDto::from(&record),
        }),
    ))
}
