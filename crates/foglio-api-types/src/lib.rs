//! Shared request and response types for the Foglio blog API.
//!
//! Every JSON body accepted or produced by the HTTP surface lives here so
//! that server, tests, and client code agree on one set of shapes.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// ----- Auth -----

/// Registration payload. Absent fields deserialize to empty strings and are
/// rejected by field validation, which reports the field by name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: OffsetDateTime,
}

/// Returned by login. `token` is the raw bearer credential; it is shown
/// exactly once and never stored server-side in recoverable form.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

// ----- Posts -----

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostCreateRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Author reference embedded in post and comment bodies.
#[derive(Debug, Deserialize, Serialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: AuthorResponse,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostListItem {
    pub id: Uuid,
    pub title: String,
    pub comment_count: i64,
    pub author: AuthorResponse,
}

/// List envelope: `count` always equals `results.len()` because the list
/// surface is not windowed.
#[derive(Debug, Deserialize, Serialize)]
pub struct PostListResponse {
    pub count: u64,
    pub results: Vec<PostListItem>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: AuthorResponse,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub comments: Vec<CommentResponse>,
}

// ----- Comments -----

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentCreateRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub author: AuthorResponse,
    pub created_at: OffsetDateTime,
}

// ----- Operational -----

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
