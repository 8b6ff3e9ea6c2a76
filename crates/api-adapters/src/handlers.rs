//! Request handlers. Each one binds its inputs, calls exactly one
//! `FeedService` operation and shapes the result.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{AppError, PostId};
use serde_json::{json, Value};

use crate::dto::{CreatePostRequest, EditTextRequest, ListParams, PostListResponse, PostResponse};
use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::router::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    ApiError(AppError::Validation(err.to_string()))
}

fn post_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<PostId> {
    path.map(|Path(id)| PostId(id)).map_err(bad_request)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_posts(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<PostListResponse>> {
    let Query(params) = params.map_err(bad_request)?;
    let page = state.feed.list_posts(params.into()).await?;
    Ok(Json(page.into()))
}

pub async fn get_post(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<PostResponse>> {
    let post = state.feed.get_post(post_id(path)?).await?;
    Ok(Json(post.into()))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    let Json(body) = body.map_err(bad_request)?;
    let post = state.feed.create_post(&user, body.into()).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

pub async fn edit_post_text(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<EditTextRequest>, JsonRejection>,
) -> ApiResult<Json<PostResponse>> {
    let id = post_id(path)?;
    let Json(body) = body.map_err(bad_request)?;
    let post = state.feed.edit_post(&user, id, &body.text).await?;
    Ok(Json(post.into()))
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<PostResponse>> {
    let post = state.feed.delete_post(&user, post_id(path)?).await?;
    Ok(Json(post.into()))
}
