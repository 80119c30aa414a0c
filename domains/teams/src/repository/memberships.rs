//! Membership repository

use crate::domain::entities::TeamMember;
use peerteam_common::Result;
use sqlx::PgPool;

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a team's members with their user names and assignment handles
    pub async fn list_by_team(&self, team_id: i64) -> Result<Vec<TeamMember>> {
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT u.id, u.name, COALESCE(p.handle, u.name) AS handle
            FROM teams_users tu
            INNER JOIN teams t ON t.id = tu.team_id
            INNER JOIN users u ON u.id = tu.user_id
            LEFT JOIN participants p
                ON p.user_id = tu.user_id AND p.assignment_id = t.assignment_id
            WHERE tu.team_id = $1
            ORDER BY handle ASC, u.id ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// User ids of a team's members, in join order
    pub async fn list_user_ids(&self, team_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM teams_users WHERE team_id = $1 ORDER BY id ASC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
