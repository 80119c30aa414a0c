//! Route definitions for Teams domain API

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::student_teams;
use super::middleware::TeamsState;

/// Create team CRUD routes
fn team_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/api/v1/student_teams",
            get(student_teams::list_student_teams).post(student_teams::create_student_team),
        )
        .route(
            "/api/v1/student_teams/{id}",
            get(student_teams::get_student_team)
                .put(student_teams::update_student_team)
                .patch(student_teams::update_student_team)
                .delete(student_teams::delete_student_team),
        )
}

/// Create team membership routes
fn membership_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/api/v1/student_teams/{id}/add_participant",
            post(student_teams::add_participant),
        )
        .route(
            "/api/v1/student_teams/{id}/remove_participant",
            delete(student_teams::remove_participant),
        )
}

/// Create all Teams domain API routes
pub fn routes() -> Router<TeamsState> {
    Router::new()
        .merge(team_routes())
        .merge(membership_routes())
}
