use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CommentWithAuthor, CommentsRepo, CreateCommentParams, RepoError,
};
use crate::domain::entities::{AuthorRef, CommentRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    content: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentWithAuthorRow {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    content: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    author_username: String,
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.content, c.created_at, c.updated_at,
                   u.username AS author_username
            FROM comments c
            INNER JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| CommentWithAuthor {
                author: AuthorRef {
                    id: row.author_id,
                    username: row.author_username,
                },
                comment: CommentRecord {
                    id: row.id,
                    post_id: row.post_id,
                    author_id: row.author_id,
                    content: row.content,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                },
            })
            .collect())
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, post_id, author_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, author_id, content, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.post_id)
        .bind(params.author_id)
        .bind(&params.content)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
