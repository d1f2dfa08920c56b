use axum::{
    extract::{Path, State},
    Json,
};

use crate::database::Article;
use crate::middleware::{ApiResult, ArticleId, JsonBody, Message};
use crate::services::{article_service, ArticlePatch, ArticleUpdate, Caller};
use crate::state::AppState;

/// GET /article/:param - fetch one of the caller's articles by id or title
///
/// A parameter made of digits only is looked up as an id, anything else as an
/// exact title. 404 when nothing owned by the caller matches.
pub async fn article_get(
    State(state): State<AppState>,
    caller: Caller,
    Path(param): Path<String>,
) -> ApiResult<Article> {
    let mut tx = state.store.begin().await?;
    let article = article_service::get_by_param(tx.as_mut(), caller, &param).await?;
    tx.commit().await?;

    Ok(Json(article))
}

/// PUT /articles/:id - replace the provided fields
pub async fn article_put(
    State(state): State<AppState>,
    caller: Caller,
    ArticleId(id): ArticleId,
    JsonBody(changes): JsonBody<ArticleUpdate>,
) -> ApiResult<Message> {
    let mut tx = state.store.begin().await?;
    article_service::update(tx.as_mut(), caller, id, changes).await?;
    tx.commit().await?;

    Ok(Json(Message::new("Article updated")))
}

/// PATCH /articles/:id - overwrite only the keys present in the body
pub async fn article_patch(
    State(state): State<AppState>,
    caller: Caller,
    ArticleId(id): ArticleId,
    JsonBody(changes): JsonBody<ArticlePatch>,
) -> ApiResult<Message> {
    let mut tx = state.store.begin().await?;
    article_service::patch(tx.as_mut(), caller, id, changes).await?;
    tx.commit().await?;

    Ok(Json(Message::new("Article partially updated")))
}

/// DELETE /articles/:id
pub async fn article_delete(
    State(state): State<AppState>,
    caller: Caller,
    ArticleId(id): ArticleId,
) -> ApiResult<Message> {
    let mut tx = state.store.begin().await?;
    article_service::delete(tx.as_mut(), caller, id).await?;
    tx.commit().await?;

    Ok(Json(Message::new("Article deleted")))
}
