//! Transactional free functions for the Teams domain (Zero2Prod pattern)

use super::assignments::ASSIGNMENT_COLUMNS;
use super::participants::PARTICIPANT_COLUMNS;
use super::teams::TEAM_COLUMNS;
use super::users::USER_COLUMNS;
use crate::domain::entities::{capacity_for, Assignment, Participant, ReplyStatus, Team, User};
use crate::domain::membership::TeamRoster;
use sqlx::{Postgres, Transaction};

/// Lock a team row for the rest of the transaction.
///
/// Every membership mutation locks the team first, so concurrent joins and
/// leaves on one team are serialized and the capacity check cannot race.
pub async fn lock_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: i64,
) -> Result<Option<Team>, sqlx::Error> {
    let query = format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Team>(&query)
        .bind(team_id)
        .fetch_optional(&mut **transaction)
        .await
}

/// Lock a participant row for the rest of the transaction.
pub async fn lock_participant_tx(
    transaction: &mut Transaction<'_, Postgres>,
    participant_id: i64,
) -> Result<Option<Participant>, sqlx::Error> {
    let query =
        format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Participant>(&query)
        .bind(participant_id)
        .fetch_optional(&mut **transaction)
        .await
}

/// Get an assignment within a transaction
pub async fn get_assignment_tx(
    transaction: &mut Transaction<'_, Postgres>,
    assignment_id: i64,
) -> Result<Option<Assignment>, sqlx::Error> {
    let query = format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1");
    sqlx::query_as::<_, Assignment>(&query)
        .bind(assignment_id)
        .fetch_optional(&mut **transaction)
        .await
}

/// Get a user within a transaction
pub async fn get_user_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .fetch_optional(&mut **transaction)
        .await
}

/// Load a team's capacity and member ids. The team row should already be locked.
pub async fn load_roster_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team: Team,
) -> Result<TeamRoster, sqlx::Error> {
    let max_team_size = sqlx::query_scalar::<_, Option<i32>>(
        "SELECT max_team_size FROM assignments WHERE id = $1",
    )
    .bind(team.assignment_id)
    .fetch_optional(&mut **transaction)
    .await?
    .flatten();

    let member_user_ids = sqlx::query_scalar::<_, i64>(
        "SELECT user_id FROM teams_users WHERE team_id = $1 ORDER BY id ASC",
    )
    .bind(team.id)
    .fetch_all(&mut **transaction)
    .await?;

    Ok(TeamRoster::new(
        team,
        capacity_for(max_team_size),
        member_user_ids,
    ))
}

/// Count membership rows for a team within a transaction
pub async fn count_members_for_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams_users WHERE team_id = $1")
        .bind(team_id)
        .fetch_one(&mut **transaction)
        .await
}

/// Whether another team in the assignment already uses `name`
pub async fn team_name_taken_tx(
    transaction: &mut Transaction<'_, Postgres>,
    assignment_id: i64,
    name: &str,
    excluding_team_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM teams
            WHERE assignment_id = $1 AND name = $2
              AND ($3::BIGINT IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(assignment_id)
    .bind(name)
    .bind(excluding_team_id)
    .fetch_one(&mut **transaction)
    .await
}

/// Create a team within an existing transaction.
pub async fn create_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    assignment_id: i64,
    name: &str,
) -> Result<Team, sqlx::Error> {
    let query = format!(
        "INSERT INTO teams (name, assignment_id) VALUES ($1, $2) RETURNING {TEAM_COLUMNS}"
    );
    sqlx::query_as::<_, Team>(&query)
        .bind(name)
        .bind(assignment_id)
        .fetch_one(&mut **transaction)
        .await
}

/// Rename a team within an existing transaction.
pub async fn rename_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: i64,
    name: &str,
) -> Result<Team, sqlx::Error> {
    let query = format!(
        "UPDATE teams SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {TEAM_COLUMNS}"
    );
    sqlx::query_as::<_, Team>(&query)
        .bind(team_id)
        .bind(name)
        .fetch_one(&mut **transaction)
        .await
}

/// Delete a team within an existing transaction.
///
/// Membership rows cascade; participants' `team_id` is cleared by the foreign key.
/// Returns whether a row was deleted.
pub async fn delete_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(team_id)
        .execute(&mut **transaction)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Create a membership row within an existing transaction.
pub async fn create_membership_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: i64,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO teams_users (team_id, user_id) VALUES ($1, $2)")
        .bind(team_id)
        .bind(user_id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Delete a membership row within an existing transaction.
pub async fn delete_membership_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: i64,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM teams_users WHERE team_id = $1 AND user_id = $2")
        .bind(team_id)
        .bind(user_id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Point a participant at a team (or clear it) within an existing transaction.
pub async fn set_participant_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    participant_id: i64,
    team_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE participants SET team_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(participant_id)
        .bind(team_id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Whether a handle is already used within an assignment
pub async fn handle_taken_tx(
    transaction: &mut Transaction<'_, Postgres>,
    assignment_id: i64,
    handle: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM participants WHERE assignment_id = $1 AND handle = $2)",
    )
    .bind(assignment_id)
    .bind(handle)
    .fetch_one(&mut **transaction)
    .await
}

/// Create a participant within an existing transaction.
pub async fn create_participant_tx(
    transaction: &mut Transaction<'_, Postgres>,
    assignment_id: i64,
    user_id: i64,
    handle: &str,
) -> Result<Participant, sqlx::Error> {
    let query = format!(
        "INSERT INTO participants (assignment_id, user_id, handle) VALUES ($1, $2, $3) \
         RETURNING {PARTICIPANT_COLUMNS}"
    );
    sqlx::query_as::<_, Participant>(&query)
        .bind(assignment_id)
        .bind(user_id)
        .bind(handle)
        .fetch_one(&mut **transaction)
        .await
}

/// Delete a participant within an existing transaction.
pub async fn delete_participant_tx(
    transaction: &mut Transaction<'_, Postgres>,
    participant_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM participants WHERE id = $1")
        .bind(participant_id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Delete a user's pending invitations for an assignment within an existing transaction.
///
/// Returns the number of invitations removed.
pub async fn delete_pending_invitations_tx(
    transaction: &mut Transaction<'_, Postgres>,
    from_id: i64,
    assignment_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM invitations WHERE from_id = $1 AND assignment_id = $2 AND reply_status = $3",
    )
    .bind(from_id)
    .bind(assignment_id)
    .bind(ReplyStatus::Waiting)
    .execute(&mut **transaction)
    .await?;
    Ok(result.rows_affected())
}
