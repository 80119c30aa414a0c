//! Participant repository

use crate::domain::entities::Participant;
use peerteam_common::Result;
use sqlx::PgPool;

pub(crate) const PARTICIPANT_COLUMNS: &str =
    "id, user_id, assignment_id, handle, team_id, created_at, updated_at";

#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find participant by ID
    pub async fn get_by_id(&self, participant_id: i64) -> Result<Option<Participant>> {
        let query = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1");
        let row = sqlx::query_as::<_, Participant>(&query)
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}
