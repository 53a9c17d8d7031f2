use crate::error::ApiError;
use crate::state::{AppState, AuthUser};
use api_shared::auth::parse_bearer;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use cellcount_auth::AuthError;

/// Bearer token check for protected routes.
///
/// On success, inserts [`AuthUser`] into request extensions for handlers to use. A
/// token that fails authentication also loses its counting session.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = parse_bearer(header)?;

    let username = match state.auth.authenticate(&token) {
        Ok(username) => username,
        Err(e @ AuthError::InvalidToken) => {
            state.sessions.lock().await.remove(&token);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(AuthUser { username, token });
    Ok(next.run(req).await)
}
