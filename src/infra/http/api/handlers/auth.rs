//! Auth handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::accounts::{LoginCommand, Principal, RegisterCommand};

use super::account_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::infra::http::api::state::ApiState;

pub async fn register(
    State(state): State<ApiState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = RegisterCommand {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        password_confirm: payload.password_confirm,
        first_name: payload.first_name,
        last_name: payload.last_name,
    };

    let user = state
        .accounts
        .register(command)
        .await
        .map_err(account_to_api)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<ApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = LoginCommand {
        username: payload.username,
        password: payload.password,
    };

    let session = state
        .accounts
        .login(command)
        .await
        .map_err(account_to_api)?;

    Ok(Json(LoginResponse {
        token: session.token,
        user: UserResponse::from(session.user),
    }))
}

pub async fn profile(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .accounts
        .profile(principal.user_id)
        .await
        .map_err(account_to_api)?;

    Ok(Json(UserResponse::from(user)))
}
