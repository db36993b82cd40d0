//! Wire models for the JSON API.
//!
//! The shapes themselves live in the `foglio-api-types` crate so clients and
//! tests share them; this module adds the conversions from internal
//! projections.

pub use foglio_api_types::{
    AuthorResponse, CommentCreateRequest, CommentResponse, HealthResponse, LoginRequest,
    LoginResponse, PostCreateRequest, PostDetailResponse, PostListItem, PostListResponse,
    PostResponse, RegisterRequest, UserResponse,
};

use crate::application::blog::PostDetail;
use crate::application::repos::{CommentWithAuthor, PostListing, PostWithAuthor};
use crate::domain::entities::{AuthorRef, UserRecord};

impl From<AuthorRef> for AuthorResponse {
    fn from(author: AuthorRef) -> Self {
        Self {
            id: author.id,
            username: author.username,
        }
    }
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

impl From<PostListing> for PostListItem {
    fn from(listing: PostListing) -> Self {
        Self {
            id: listing.id,
            title: listing.title,
            comment_count: listing.comment_count,
            author: listing.author.into(),
        }
    }
}

impl From<PostWithAuthor> for PostResponse {
    fn from(value: PostWithAuthor) -> Self {
        Self {
            id: value.post.id,
            title: value.post.title,
            content: value.post.content,
            author: value.author.into(),
            created_at: value.post.created_at,
            updated_at: value.post.updated_at,
        }
    }
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(value: CommentWithAuthor) -> Self {
        Self {
            id: value.comment.id,
            content: value.comment.content,
            author: value.author.into(),
            created_at: value.comment.created_at,
        }
    }
}

impl From<PostDetail> for PostDetailResponse {
    fn from(detail: PostDetail) -> Self {
        Self {
            id: detail.post.post.id,
            title: detail.post.post.title,
            content: detail.post.post.content,
            author: detail.post.author.into(),
            created_at: detail.post.post.created_at,
            updated_at: detail.post.post.updated_at,
            comments: detail.comments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Wrap listings in the `{count, results}` envelope; `count` is the full
/// result length because the list surface is not windowed.
pub fn list_envelope(listings: Vec<PostListing>) -> PostListResponse {
    PostListResponse {
        count: listings.len() as u64,
        results: listings.into_iter().map(Into::into).collect(),
    }
}
