//! User repository

use crate::domain::entities::{NewUser, User};
use peerteam_common::Result;
use sqlx::PgPool;

pub(crate) const USER_COLUMNS: &str = "id, name, handle, email, full_name, created_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Create a new user
    pub async fn create(&self, user: &NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (name, handle, email, full_name) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.handle)
            .bind(&user.email)
            .bind(&user.full_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }
}
