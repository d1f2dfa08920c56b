use axum::{extract::State, Json};

use crate::middleware::{ApiResult, JsonBody, TokenResponse};
use crate::services::Credentials;
use crate::state::AppState;

/// POST /login - exchange credentials for a bearer token
///
/// Expected Input:
/// ```json
/// { "username": "alice", "password": "pw1" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "token": "eyJhbGciOiJIUzI1NiI..." }
/// ```
///
/// 400 when a field is missing, 401 for unknown users and wrong passwords.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> ApiResult<TokenResponse> {
    let token = state.credentials.login(state.store.as_ref(), credentials).await?;

    Ok(Json(TokenResponse { token }))
}
