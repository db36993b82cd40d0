pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

/// Assemble the `/api` surface.
///
/// Reads and account onboarding are public. Writes and the profile
/// endpoint sit behind [`middleware::require_auth`], which rejects
/// unauthenticated requests before any handler runs.
pub fn build_api_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    let public = Router::new()
        .route("/api/posts", get(handlers::list_posts))
        .route("/api/posts/{id}", get(handlers::post_detail))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login));

    let protected = Router::new()
        .route("/api/posts", post(handlers::create_post))
        .route("/api/posts/{id}/comments", post(handlers::create_comment))
        .route("/api/auth/profile", get(handlers::profile))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::require_auth,
        ));

    public.merge(protected).with_state(state)
}
