use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateTokenParams, RepoError, TokensRepo};
use crate::domain::entities::AuthTokenRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: Uuid,
    user_id: Uuid,
    prefix: String,
    hashed_secret: Vec<u8>,
    created_at: OffsetDateTime,
    last_used_at: Option<OffsetDateTime>,
    expires_at: Option<OffsetDateTime>,
}

impl From<TokenRow> for AuthTokenRecord {
    fn from(row: TokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            prefix: row.prefix,
            hashed_secret: row.hashed_secret,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl TokensRepo for PostgresRepositories {
    async fn create_token(
        &self,
        params: CreateTokenParams,
    ) -> Result<AuthTokenRecord, RepoError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            INSERT INTO auth_tokens (id, user_id, prefix, hashed_secret, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, prefix, hashed_secret, created_at, last_used_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.user_id)
        .bind(&params.prefix)
        .bind(&params.hashed_secret)
        .bind(params.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<AuthTokenRecord>, RepoError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, user_id, prefix, hashed_secret, created_at, last_used_at, expires_at
            FROM auth_tokens
            WHERE prefix = $1
            "#,
        )
        .bind(prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthTokenRecord::from))
    }

    async fn touch_last_used(&self, id: Uuid, at: OffsetDateTime) -> Result<(), RepoError> {
        sqlx::query("UPDATE auth_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
