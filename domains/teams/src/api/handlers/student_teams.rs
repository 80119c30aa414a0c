//! Student team API handlers
//!
//! Students list, create, rename, and delete their teams, and move
//! participants in and out of them. Membership rules are enforced by the
//! store; these handlers resolve ids and shape the JSON envelopes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use peerteam_common::{Error, JsonBody, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::entities::{Participant, Team, TeamMember};
use crate::domain::membership::TeamError;
use crate::domain::validation::{error_messages, validate_team_name};

/// Query carrying the acting student's participant id
#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub id: Option<String>,
}

/// Query naming the participant to add or remove
#[derive(Debug, Default, Deserialize)]
pub struct ParticipantQuery {
    pub participant_id: Option<String>,
}

/// Team fields accepted on create and rename
#[derive(Debug, Deserialize, Validate)]
pub struct TeamParams {
    #[validate(custom(function = "validate_team_name"))]
    pub name: String,
}

/// Request body: `{"team": {"name": "..."}}`
#[derive(Debug, Deserialize, Validate)]
pub struct TeamRequest {
    #[validate(nested)]
    pub team: TeamParams,
}

/// Team response for API operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamResponse {
    pub id: i64,
    pub name: String,
    pub assignment_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            assignment_id: team.assignment_id,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

/// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<TeamMember>>,
}

impl SuccessResponse {
    fn new() -> Self {
        Self {
            status: "success",
            message: None,
            team: None,
            teams: None,
            members: None,
        }
    }

    fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn team(mut self, team: Team) -> Self {
        self.team = Some(team.into());
        self
    }
}

/// Ids arrive as strings; anything that is not an integer matches nothing.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

async fn load_student(state: &TeamsState, raw_id: Option<&str>) -> Result<Participant> {
    let not_found = || Error::NotFound("Student not found".to_string());
    let id = raw_id.and_then(parse_id).ok_or_else(not_found)?;
    state
        .store
        .find_participant(id)
        .await
        .map_err(|e| Error::internal("Failed to fetch student", e))?
        .ok_or_else(not_found)
}

async fn load_team(state: &TeamsState, raw_id: &str) -> Result<Team> {
    let not_found = || Error::NotFound("Team not found".to_string());
    let id = parse_id(raw_id).ok_or_else(not_found)?;
    state
        .store
        .find_team(id)
        .await
        .map_err(|e| Error::internal("Failed to fetch team", e))?
        .ok_or_else(not_found)
}

async fn load_participant(state: &TeamsState, raw_id: Option<&str>) -> Result<Participant> {
    let raw_id = raw_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::Unprocessable("Participant ID is required".to_string()))?;
    let not_found = || Error::from(TeamError::ParticipantNotFound);
    let id = parse_id(raw_id).ok_or_else(not_found)?;
    state
        .store
        .find_participant(id)
        .await
        .map_err(|e| Error::internal("Failed to fetch participant", e))?
        .ok_or_else(not_found)
}

fn validation_failure(error: &str, errors: validator::ValidationErrors) -> Error {
    Error::Validation {
        error: error.to_string(),
        details: error_messages(&errors),
    }
}

/// List a student's teams
///
/// **GET /api/v1/student_teams?id=**
pub async fn list_student_teams(
    State(state): State<TeamsState>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<SuccessResponse>> {
    let student = load_student(&state, query.id.as_deref()).await?;

    let teams = state
        .store
        .teams_for_participant(&student)
        .await
        .map_err(|e| Error::internal("Failed to fetch teams", e))?;

    let mut response = SuccessResponse::new();
    response.teams = Some(teams.into_iter().map(TeamResponse::from).collect());
    Ok(Json(response))
}

/// Show a team with its members
///
/// **GET /api/v1/student_teams/{id}**
pub async fn get_student_team(
    State(state): State<TeamsState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let team = load_team(&state, &id).await?;

    let members = state
        .store
        .team_members(team.id)
        .await
        .map_err(|e| Error::internal("Failed to fetch team members", e))?;

    let mut response = SuccessResponse::new().team(team);
    response.members = Some(members);
    Ok(Json(response))
}

/// Create a team with the student as its first member
///
/// **POST /api/v1/student_teams?id=**
pub async fn create_student_team(
    State(state): State<TeamsState>,
    Query(query): Query<StudentQuery>,
    JsonBody(request): JsonBody<TeamRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>)> {
    let student = load_student(&state, query.id.as_deref()).await?;

    request
        .validate()
        .map_err(|e| validation_failure("Failed to create team", e))?;

    let team = state
        .store
        .create_team(student.id, &request.team.name)
        .await
        .inspect_err(|e| tracing::debug!(participant_id = student.id, error = %e, "Team creation refused"))?;

    tracing::info!(
        team_id = team.id,
        assignment_id = team.assignment_id,
        participant_id = student.id,
        "Student team created"
    );

    Ok((
        StatusCode::CREATED,
        Json(
            SuccessResponse::new()
                .message("Team created successfully")
                .team(team),
        ),
    ))
}

/// Rename a team
///
/// **PUT|PATCH /api/v1/student_teams/{id}**
pub async fn update_student_team(
    State(state): State<TeamsState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<TeamRequest>,
) -> Result<Json<SuccessResponse>> {
    let team = load_team(&state, &id).await?;

    request
        .validate()
        .map_err(|e| validation_failure("Failed to update team name", e))?;

    let team = state
        .store
        .rename_team(team.id, &request.team.name)
        .await?;

    tracing::info!(team_id = team.id, name = %team.name, "Student team renamed");

    Ok(Json(
        SuccessResponse::new()
            .message("Team name updated successfully")
            .team(team),
    ))
}

/// Delete a team, its memberships, and participant associations
///
/// **DELETE /api/v1/student_teams/{id}**
pub async fn delete_student_team(
    State(state): State<TeamsState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let team = load_team(&state, &id).await?;

    match state.store.delete_team(team.id).await {
        Ok(true) => {
            tracing::info!(team_id = team.id, "Student team deleted");
            Ok(Json(SuccessResponse::new().message("Team successfully deleted")))
        }
        Ok(false) => Err(Error::Unprocessable("Failed to delete team".to_string())),
        Err(TeamError::Storage { reason, .. }) => Err(Error::Unexpected(anyhow::anyhow!(reason))),
        Err(other) => Err(other.into()),
    }
}

/// Add a participant to a team
///
/// **POST /api/v1/student_teams/{id}/add_participant?participant_id=**
pub async fn add_participant(
    State(state): State<TeamsState>,
    Path(id): Path<String>,
    Query(query): Query<ParticipantQuery>,
) -> Result<Json<SuccessResponse>> {
    let team = load_team(&state, &id).await?;
    let participant = load_participant(&state, query.participant_id.as_deref()).await?;

    let addition = state
        .store
        .add_member(team.id, participant.id)
        .await
        .inspect_err(|e| {
            tracing::debug!(
                team_id = team.id,
                participant_id = participant.id,
                error = %e,
                "Participant not added"
            )
        })?;

    tracing::info!(
        team_id = team.id,
        participant_id = participant.id,
        team_size = addition.team_size,
        "Participant added to team"
    );

    Ok(Json(
        SuccessResponse::new().message("Participant added to the team successfully"),
    ))
}

/// Remove a participant from a team
///
/// **DELETE /api/v1/student_teams/{id}/remove_participant?participant_id=**
pub async fn remove_participant(
    State(state): State<TeamsState>,
    Path(id): Path<String>,
    Query(query): Query<ParticipantQuery>,
) -> Result<Json<SuccessResponse>> {
    let team = load_team(&state, &id).await?;
    let participant = load_participant(&state, query.participant_id.as_deref()).await?;

    let removal = state
        .store
        .remove_member(team.id, participant.id)
        .await?;

    tracing::info!(
        team_id = team.id,
        participant_id = participant.id,
        team_deleted = removal.team_deleted,
        "Participant removed from team"
    );

    Ok(Json(SuccessResponse::new().message(removal.message())))
}
