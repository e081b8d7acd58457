//! API routes for the premium link server.

pub mod admin;
pub mod health;
pub mod premium;

use axum::Router;

use crate::state::AppState;

/// Creates the main API router with all routes mounted.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1", api_v1_routes(state))
}

/// Creates the v1 API routes.
fn api_v1_routes(state: AppState) -> Router {
    Router::new().nest(
        "/premium",
        premium::router(state.clone()).merge(admin::router(state)),
    )
}
