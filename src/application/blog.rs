//! Post and comment operations, read through the cache.
//!
//! Reads consult the cache first and repopulate it on a miss; writes go
//! straight to the repositories and then drop the affected keys. Cache
//! trouble never surfaces here: the policy layer absorbs store errors, so
//! every read falls back to the repositories.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::application::accounts::Principal;
use crate::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, CreatePostParams, PostListing,
    PostWithAuthor, PostsRepo, RepoError,
};
use crate::cache::{CacheKey, ReadCache};
use crate::domain::entities::CommentRecord;

const MIN_COMMENT_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("field `{0}` must not be blank")]
    ConstraintViolation(&'static str),
    #[error("comment content must be at least {MIN_COMMENT_LEN} characters long")]
    CommentTooShort,
    #[error("post not found")]
    PostNotFound,
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CreateCommentCommand {
    pub content: String,
}

/// Detail projection cached under `post_detail_{id}` as a single entry,
/// comments included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: PostWithAuthor,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Clone)]
pub struct BlogService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    cache: ReadCache,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        cache: ReadCache,
    ) -> Self {
        Self {
            posts,
            comments,
            cache,
        }
    }

    /// All posts with author and comment count, via `posts_list`.
    pub async fn list_posts(&self) -> Result<Vec<PostListing>, BlogError> {
        let key = CacheKey::PostsList;
        if let Some(cached) = self.cache.get_json::<Vec<PostListing>>(&key).await {
            return Ok(cached);
        }

        let listings = self.posts.list_with_comment_counts().await?;
        self.cache.put_json(&key, &listings).await;
        Ok(listings)
    }

    /// One post with its comments, via `post_detail_{id}`. Misses are not
    /// cached; an absent post is a 404 on every request.
    pub async fn post_detail(&self, id: Uuid) -> Result<PostDetail, BlogError> {
        let key = CacheKey::PostDetail(id);
        if let Some(cached) = self.cache.get_json::<PostDetail>(&key).await {
            return Ok(cached);
        }

        let post = self
            .posts
            .find_with_author(id)
            .await?
            .ok_or(BlogError::PostNotFound)?;
        let comments = self.comments.list_for_post(id).await?;
        let detail = PostDetail { post, comments };
        self.cache.put_json(&key, &detail).await;
        Ok(detail)
    }

    pub async fn create_post(
        &self,
        author: &Principal,
        cmd: CreatePostCommand,
    ) -> Result<PostWithAuthor, BlogError> {
        let title = cmd.title.trim();
        ensure_non_empty(title, "title")?;
        ensure_non_empty(&cmd.content, "content")?;

        let record = self
            .posts
            .create_post(CreatePostParams {
                title: title.to_string(),
                content: cmd.content,
                author_id: author.user_id,
            })
            .await?;

        // a new post changes the list aggregate; its own keys cannot be
        // populated yet
        self.cache.invalidate(&CacheKey::PostsList).await;

        Ok(PostWithAuthor {
            post: record,
            author: author.author_ref(),
        })
    }

    /// The post is resolved before the payload is validated, so a missing
    /// post is a 404 even when the comment itself would be rejected.
    pub async fn create_comment(
        &self,
        author: &Principal,
        post_id: Uuid,
        cmd: CreateCommentCommand,
    ) -> Result<CommentRecord, BlogError> {
        if self.posts.find_with_author(post_id).await?.is_none() {
            return Err(BlogError::PostNotFound);
        }

        let content = cmd.content.trim();
        ensure_non_empty(content, "content")?;
        if content.chars().count() < MIN_COMMENT_LEN {
            return Err(BlogError::CommentTooShort);
        }

        let record = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id: author.user_id,
                content: content.to_string(),
            })
            .await?;

        // the detail embeds comments and the list embeds comment counts
        self.cache.invalidate_post_scope(post_id).await;

        Ok(record)
    }
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), BlogError> {
    if value.trim().is_empty() {
        return Err(BlogError::ConstraintViolation(field));
    }
    Ok(())
}
