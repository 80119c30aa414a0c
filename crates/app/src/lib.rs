//! Peerteam application composition root
//!
//! Composes the domain routers into a single application.

use std::sync::Arc;

use axum::Router;
use peerteam_teams::{TeamStore, TeamsRepositories, TeamsState};
use sqlx::PgPool;

/// Banner served at `/`
pub const BANNER: &str = concat!("Peerteam API v", env!("CARGO_PKG_VERSION"));

/// Create the main application router backed by PostgreSQL
pub async fn create_app(pool: PgPool) -> Result<Router, anyhow::Error> {
    let store: Arc<dyn TeamStore> = Arc::new(TeamsRepositories::new(pool));
    Ok(build_router(store))
}

/// Build the router around any [`TeamStore`]
pub fn build_router(store: Arc<dyn TeamStore>) -> Router {
    let teams_state = TeamsState::new(store);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/", axum::routing::get(|| async { BANNER }))
        .merge(peerteam_teams::routes().with_state(teams_state))
}

/// Health check endpoint
#[mutants::skip] // Constant response
async fn health_check() -> &'static str {
    "OK"
}
