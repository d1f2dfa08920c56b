use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;

/// `Json` whose rejections render as `ApiError` bodies
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Integer article id from the path; anything else is a 404
#[derive(Debug, Clone, Copy, Deserialize, FromRequestParts)]
#[serde(transparent)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ArticleId(pub i64);
