//! API handlers organized by resource type.
//!
//! Each submodule contains handlers for a specific resource (auth, posts).
//! Helper functions for error conversion are defined here and shared across modules.

mod auth;
mod posts;

pub use auth::*;
pub use posts::*;

// ----- Shared error conversions -----

use axum::http::StatusCode;

use crate::application::accounts::AccountError;
use crate::application::blog::BlogError;
use crate::application::repos::RepoError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn blog_to_api(err: BlogError) -> ApiError {
    match err {
        BlogError::ConstraintViolation(field) => {
            ApiError::validation("This field may not be blank", Some(field.to_string()))
        }
        BlogError::CommentTooShort => ApiError::validation(
            "Comment content must be at least 5 characters long",
            Some("content".to_string()),
        ),
        BlogError::PostNotFound => ApiError::not_found("post not found"),
        BlogError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn account_to_api(err: AccountError) -> ApiError {
    match err {
        AccountError::ConstraintViolation(field) => {
            ApiError::validation("This field may not be blank", Some(field.to_string()))
        }
        AccountError::PasswordMismatch => ApiError::validation("Passwords do not match", None),
        AccountError::UsernameTaken => ApiError::validation(
            "A user with that username already exists",
            Some("username".to_string()),
        ),
        AccountError::InvalidCredentials => ApiError::validation("Invalid credentials", None),
        AccountError::NotFound => ApiError::not_found("user not found"),
        AccountError::Hashing(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::HASHING,
            "Password hashing failed",
            Some(message),
        ),
        AccountError::Repo(repo) => repo_to_api(repo),
    }
}
