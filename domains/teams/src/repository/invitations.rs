//! Invitation repository

use crate::domain::entities::{Invitation, ReplyStatus};
use peerteam_common::Result;
use sqlx::PgPool;

pub(crate) const INVITATION_COLUMNS: &str =
    "id, assignment_id, from_id, to_id, reply_status, created_at";

#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new pending invitation
    pub async fn create(&self, assignment_id: i64, from_id: i64, to_id: i64) -> Result<Invitation> {
        let query = format!(
            "INSERT INTO invitations (assignment_id, from_id, to_id, reply_status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {INVITATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Invitation>(&query)
            .bind(assignment_id)
            .bind(from_id)
            .bind(to_id)
            .bind(ReplyStatus::Waiting)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// Record a reply to an invitation
    pub async fn update_reply(
        &self,
        invitation_id: i64,
        reply_status: ReplyStatus,
    ) -> Result<Option<Invitation>> {
        let query = format!(
            "UPDATE invitations SET reply_status = $2 WHERE id = $1 \
             RETURNING {INVITATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Invitation>(&query)
            .bind(invitation_id)
            .bind(reply_status)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// List pending invitations sent by a user within an assignment
    pub async fn list_pending_from(
        &self,
        from_id: i64,
        assignment_id: i64,
    ) -> Result<Vec<Invitation>> {
        let query = format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations \
             WHERE from_id = $1 AND assignment_id = $2 AND reply_status = $3 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, Invitation>(&query)
            .bind(from_id)
            .bind(assignment_id)
            .bind(ReplyStatus::Waiting)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
