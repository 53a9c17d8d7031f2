use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, AuthUser};
use api_shared::{LoginReq, LoginRes, LogoutRes, RegisterReq, RegisterRes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use cellcount_auth::RegistrationRequest;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = RegisterRes),
        (status = 400, description = "Invalid registration form", body = api_shared::ErrorRes),
        (status = 409, description = "Username already taken", body = api_shared::ErrorRes),
        (status = 500, description = "Internal server error", body = api_shared::ErrorRes)
    )
)]
/// Register a new user.
///
/// All fields are required. The password must be 8-20 characters and contain upper and
/// lower case letters, a digit and one of `@$!%*?&`.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> ApiResult<(StatusCode, Json<RegisterRes>)> {
    let request = RegistrationRequest {
        username: req.username,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password: req.password,
    };
    let auth = state.auth.clone();
    let username = tokio::task::spawn_blocking(move || auth.register(&request)).await??;
    Ok((StatusCode::CREATED, Json(RegisterRes { username })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = LoginRes),
        (status = 401, description = "Invalid username or password", body = api_shared::ErrorRes)
    )
)]
/// Exchange username and password for a bearer token.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> ApiResult<Json<LoginRes>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".into(),
        ));
    }
    let auth = state.auth.clone();
    let login =
        tokio::task::spawn_blocking(move || auth.login(&req.username, &req.password)).await??;
    state.prune_sessions().await;
    Ok(Json(LoginRes {
        token: login.token.to_string(),
        username: login.username,
        expires_at: login.expires_at.to_rfc3339(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out; the counting session is discarded", body = LogoutRes),
        (status = 401, description = "Missing or invalid token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Drop the caller's token and any unsaved counting session.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<LogoutRes> {
    state.sessions.lock().await.remove(&user.token);
    let ok = state.auth.logout(&user.token).is_some();
    Json(LogoutRes { ok })
}
