use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostListing, PostWithAuthor, PostsRepo, RepoError,
};
use crate::domain::entities::{AuthorRef, PostRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    author_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostListingRow {
    id: Uuid,
    title: String,
    author_id: Uuid,
    author_username: String,
    comment_count: i64,
    created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct PostWithAuthorRow {
    id: Uuid,
    title: String,
    content: String,
    author_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    author_username: String,
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_with_comment_counts(&self) -> Result<Vec<PostListing>, RepoError> {
        let rows = sqlx::query_as::<_, PostListingRow>(
            r#"
            SELECT p.id, p.title, p.author_id, u.username AS author_username,
                   COUNT(c.id) AS comment_count, p.created_at
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            LEFT JOIN comments c ON c.post_id = p.id
            GROUP BY p.id, p.title, p.author_id, u.username, p.created_at
            ORDER BY p.created_at ASC, p.id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| PostListing {
                id: row.id,
                title: row.title,
                author: AuthorRef {
                    id: row.author_id,
                    username: row.author_username,
                },
                comment_count: row.comment_count,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let row = sqlx::query_as::<_, PostWithAuthorRow>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, p.created_at, p.updated_at,
                   u.username AS author_username
            FROM posts p
            INNER JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| PostWithAuthor {
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
            },
            post: PostRecord {
                id: row.id,
                title: row.title,
                content: row.content,
                author_id: row.author_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }))
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, title, content, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, author_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
