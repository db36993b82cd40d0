use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::accounts::AuthError;

use super::error::{ApiError, codes};
use super::state::ApiState;

/// Resolve the bearer credential and attach the caller's [`Principal`] to
/// request extensions. A request with no credential is rejected with 403;
/// one with a bad or expired credential with 401. Either way the rejection
/// happens before the handler runs, so failed writes leave no side effects.
///
/// [`Principal`]: crate::application::accounts::Principal
pub async fn require_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(request.headers().get(axum::http::header::AUTHORIZATION));

    let token = match token {
        Some(value) => value,
        None => return ApiError::not_authenticated().into_response(),
    };

    let principal = match state.accounts.authenticate(&token).await {
        Ok(principal) => principal,
        Err(AuthError::Invalid) => return ApiError::invalid_token().into_response(),
        Err(AuthError::Expired) => {
            return ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::INVALID_TOKEN,
                "Token expired",
                None,
            )
            .into_response();
        }
    };

    request.extensions_mut().insert(principal);

    next.run(request).await
}

/// Both `Bearer <token>` and `Token <token>` schemes are accepted; older
/// clients send the latter. A header with any other scheme counts as no
/// credential at all.
fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("Token "))
        .map(|token| token.to_string())
}
