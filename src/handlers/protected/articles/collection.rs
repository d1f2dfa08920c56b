use axum::{extract::State, Json};

use crate::database::ArticleSummary;
use crate::middleware::{ApiResult, JsonBody, Message};
use crate::services::{article_service, Caller, NewArticleInput};
use crate::state::AppState;

/// POST /articles - create an article owned by the caller
pub async fn article_create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(input): JsonBody<NewArticleInput>,
) -> ApiResult<Message> {
    let mut tx = state.store.begin().await?;
    article_service::create(tx.as_mut(), caller, input).await?;
    tx.commit().await?;

    Ok(Json(Message::new("Article created")))
}

/// GET /articles - `[{id, title}]` for the caller's articles
pub async fn article_list(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<ArticleSummary>> {
    let mut tx = state.store.begin().await?;
    let articles = article_service::list(tx.as_mut(), caller).await?;
    tx.commit().await?;

    Ok(Json(articles))
}
