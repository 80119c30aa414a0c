//! Assignment repository

use crate::domain::entities::Assignment;
use peerteam_common::Result;
use sqlx::PgPool;

pub(crate) const ASSIGNMENT_COLUMNS: &str = "id, name, max_team_size, created_at, updated_at";

#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find assignment by ID
    pub async fn get_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let query = format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1");
        let row = sqlx::query_as::<_, Assignment>(&query)
            .bind(assignment_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Create a new assignment
    pub async fn create(&self, name: &str, max_team_size: Option<i32>) -> Result<Assignment> {
        let query = format!(
            "INSERT INTO assignments (name, max_team_size) VALUES ($1, $2) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Assignment>(&query)
            .bind(name)
            .bind(max_team_size)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }
}
