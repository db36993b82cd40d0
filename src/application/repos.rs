//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    AuthTokenRecord, AuthorRef, CommentRecord, PostRecord, UserRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct CreateTokenParams {
    pub user_id: Uuid,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

/// One row of the public list query: post columns joined with the author
/// and an aggregate comment count. Serializable so the whole listing can
/// live in the read cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostListing {
    pub id: Uuid,
    pub title: String,
    pub author: AuthorRef,
    pub comment_count: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    pub post: PostRecord,
    pub author: AuthorRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    pub comment: CommentRecord,
    pub author: AuthorRef,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait TokensRepo: Send + Sync {
    async fn create_token(&self, params: CreateTokenParams)
    -> Result<AuthTokenRecord, RepoError>;

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AuthTokenRecord>, RepoError>;

    async fn touch_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// All posts in creation order, each with its author and comment count.
    async fn list_with_comment_counts(&self) -> Result<Vec<PostListing>, RepoError>;

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments for one post in creation order.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}
