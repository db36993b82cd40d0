pub mod api;
pub mod middleware;

pub use api::{ApiState, build_api_router};

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware as axum_middleware};

use crate::application::error::ErrorReport;
use crate::infra::db::PostgresRepositories;

use self::middleware::{log_responses, set_request_context};
use api::models::HealthResponse;

/// Top-level HTTP state: the API services plus a database handle for
/// the liveness probe.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiState,
    pub db: Arc<PostgresRepositories>,
}

/// Assemble the full HTTP surface: the liveness probe plus the JSON
/// API, wrapped in the shared request-context and response-logging
/// layers.
pub fn build_router(state: AppState) -> Router {
    let probe = Router::new()
        .route("/healthz", get(healthz))
        .with_state(state.clone());

    probe
        .merge(build_api_router(state.api))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn healthz(State(state): State<AppState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".to_string(),
        })
        .into_response(),
        Err(err) => {
            let mut response = (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                }),
            )
                .into_response();
            ErrorReport::from_error("infra::http::healthz", StatusCode::SERVICE_UNAVAILABLE, &err)
                .attach(&mut response);
            response
        }
    }
}
