use axum::{extract::State, Json};

use crate::middleware::{ApiResult, JsonBody, Message};
use crate::services::Credentials;
use crate::state::AppState;

/// POST /register - create a user account
///
/// 400 when either field is missing or the username is taken. Passwords
/// longer than 72 bytes are also refused with 400.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> ApiResult<Message> {
    state.credentials.register(state.store.as_ref(), credentials).await?;

    Ok(Json(Message::new("Registered successfully")))
}
