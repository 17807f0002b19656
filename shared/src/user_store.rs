//! Users, who author articles and comments.

use anyhow::{Context, Result};

use crate::{
    store::{now_ms, BlogStore},
    User,
};

impl BlogStore {
    /// Insert a user. A blank email is stored as `NULL`.
    pub async fn create_user(&self, name: &str, email: Option<&str>) -> Result<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, created_at) VALUES (?, ?, ?) \
             RETURNING id, name, email, created_at",
        )
        .bind(name.trim())
        .bind(email.map(str::trim).filter(|email| !email.is_empty()))
        .bind(now_ms())
        .fetch_one(self.pool())
        .await
        .with_context(|| format!("failed to create user {name}"))
    }

    /// Look a user up by id.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .with_context(|| format!("failed to load user {id}"))
    }

    /// Every user, oldest first.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users ORDER BY id")
            .fetch_all(self.pool())
            .await
            .context("failed to list users")
    }
}
