//! Posts and comments handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::accounts::Principal;
use crate::application::blog::{CreateCommentCommand, CreatePostCommand};

use super::blog_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    CommentCreateRequest, CommentResponse, PostCreateRequest, PostDetailResponse, PostResponse,
    list_envelope,
};
use crate::infra::http::api::state::ApiState;

pub async fn list_posts(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let listings = state.blog.list_posts().await.map_err(blog_to_api)?;

    Ok(Json(list_envelope(listings)))
}

pub async fn post_detail(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.blog.post_detail(id).await.map_err(blog_to_api)?;

    Ok(Json(PostDetailResponse::from(detail)))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreatePostCommand {
        title: payload.title,
        content: payload.content,
    };

    let post = state
        .blog
        .create_post(&principal, command)
        .await
        .map_err(blog_to_api)?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

pub async fn create_comment(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateCommentCommand {
        content: payload.content,
    };

    let comment = state
        .blog
        .create_comment(&principal, id, command)
        .await
        .map_err(blog_to_api)?;

    let body = CommentResponse {
        id: comment.id,
        content: comment.content,
        author: principal.author_ref().into(),
        created_at: comment.created_at,
    };

    Ok((StatusCode::CREATED, Json(body)))
}
