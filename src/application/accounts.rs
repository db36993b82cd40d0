//! Registration, login, and token authentication.
//!
//! Raw tokens use the format `bk_{prefix}_{secret}`. Only the prefix and a
//! SHA-256 digest of the secret are stored; the full credential is returned
//! once at login and cannot be recovered afterwards.

use std::sync::{Arc, OnceLock};

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateTokenParams, CreateUserParams, RepoError, TokensRepo, UsersRepo,
};
use crate::domain::entities::{AuthorRef, UserRecord};

const TOKEN_PREFIX: &str = "bk";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("field `{0}` must not be blank")]
    ConstraintViolation(&'static str),
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("a user with this username already exists")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    Invalid,
    #[error("expired token")]
    Expired,
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

/// Outcome of a successful login: the persisted user plus the one-time
/// raw credential.
#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub user: UserRecord,
    pub token: String,
}

/// Authenticated caller identity, threaded explicitly into handlers.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
}

impl Principal {
    /// Author identity as embedded in post and comment responses.
    pub fn author_ref(&self) -> AuthorRef {
        AuthorRef {
            id: self.user_id,
            username: self.username.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepo>,
    tokens: Arc<dyn TokensRepo>,
    filler_hash: Arc<OnceLock<String>>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UsersRepo>, tokens: Arc<dyn TokensRepo>) -> Self {
        Self {
            users,
            tokens,
            filler_hash: Arc::new(OnceLock::new()),
        }
    }

    pub async fn register(&self, cmd: RegisterCommand) -> Result<UserRecord, AccountError> {
        let username = cmd.username.trim();
        let email = cmd.email.trim();
        ensure_non_empty(username, "username")?;
        ensure_non_empty(email, "email")?;
        ensure_non_empty(&cmd.password, "password")?;
        if cmd.password != cmd.password_confirm {
            return Err(AccountError::PasswordMismatch);
        }

        let password_hash = hash_password(&cmd.password)?;
        let record = self
            .users
            .create_user(CreateUserParams {
                username: username.to_string(),
                email: email.to_string(),
                first_name: cmd.first_name.trim().to_string(),
                last_name: cmd.last_name.trim().to_string(),
                password_hash,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => AccountError::UsernameTaken,
                other => AccountError::Repo(other),
            })?;

        Ok(record)
    }

    pub async fn login(&self, cmd: LoginCommand) -> Result<SessionIssued, AccountError> {
        let username = cmd.username.trim();
        ensure_non_empty(username, "username")?;
        ensure_non_empty(&cmd.password, "password")?;

        let Some(user) = self.users.find_by_username(username).await? else {
            // unknown usernames still burn one verification so both
            // failure paths do the same work
            let _ = verify_password(&cmd.password, self.filler_hash());
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(&cmd.password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");
        let hashed_secret = Self::hash_secret(&secret);

        self.tokens
            .create_token(CreateTokenParams {
                user_id: user.id,
                prefix,
                hashed_secret,
                expires_at: None,
            })
            .await?;

        Ok(SessionIssued { user, token })
    }

    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let parsed = Self::parse_token(token).ok_or(AuthError::Invalid)?;
        let record = self
            .tokens
            .find_by_prefix(&parsed.prefix)
            .await
            .map_err(|_| AuthError::Invalid)?
            .ok_or(AuthError::Invalid)?;

        let now = OffsetDateTime::now_utc();
        if let Some(expires_at) = record.expires_at
            && expires_at <= now
        {
            return Err(AuthError::Expired);
        }

        let hashed_input = Self::hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AuthError::Invalid);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await
            .map_err(|_| AuthError::Invalid)?
            .ok_or(AuthError::Invalid)?;

        // best-effort last_used update; do not block auth
        let tokens = self.tokens.clone();
        tokio::spawn(async move {
            let _ = tokens.touch_last_used(record.id, now).await;
        });

        Ok(Principal {
            user_id: user.id,
            username: user.username,
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserRecord, AccountError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    fn filler_hash(&self) -> &str {
        self.filler_hash
            .get_or_init(|| hash_password("foglio-login-filler").unwrap_or_default())
            .as_str()
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.splitn(3, '_');
        let prefix_tag = parts.next()?;
        if prefix_tag != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if secret.len() < MIN_SECRET_LEN || prefix.is_empty() {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

/// Hash a password into a PHC-formatted argon2id string.
fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Hashing(err.to_string()))
}

/// Verify a password against a stored PHC string. Unparseable hashes
/// count as a mismatch.
fn verify_password(password: &str, phc_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AccountError> {
    if value.trim().is_empty() {
        return Err(AccountError::ConstraintViolation(field));
    }
    Ok(())
}
