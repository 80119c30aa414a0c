//! Team repository

use crate::domain::entities::Team;
use peerteam_common::Result;
use sqlx::PgPool;

pub(crate) const TEAM_COLUMNS: &str = "id, name, assignment_id, created_at, updated_at";

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find team by ID
    pub async fn get_by_id(&self, team_id: i64) -> Result<Option<Team>> {
        let query = format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1");
        let row = sqlx::query_as::<_, Team>(&query)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Find a team by its name within an assignment
    pub async fn get_by_name(&self, assignment_id: i64, name: &str) -> Result<Option<Team>> {
        let query =
            format!("SELECT {TEAM_COLUMNS} FROM teams WHERE assignment_id = $1 AND name = $2");
        let row = sqlx::query_as::<_, Team>(&query)
            .bind(assignment_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// List the teams a user is a member of, across assignments
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Team>> {
        let rows = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name, t.assignment_id, t.created_at, t.updated_at
            FROM teams t
            INNER JOIN teams_users tu ON t.id = tu.team_id
            WHERE tu.user_id = $1
            ORDER BY t.name ASC, t.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
