//! Users repository for database operations

use sqlx::{Pool, Postgres};

use super::is_unique_violation;
use crate::{
    error::{AppError, AppResult},
    models::{
        member::Member,
        user::{RegisterForm, User},
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get user by username, ignoring case
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a reader account together with its member record
    pub async fn create_with_member(
        &self,
        form: &RegisterForm,
        password_hash: &str,
    ) -> AppResult<(User, Member)> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash, is_staff)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING *
            "#,
        )
        .bind(&form.username)
        .bind(form.first_name.trim())
        .bind(form.last_name.trim())
        .bind(form.email.trim())
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(duplicate_username)?;

        let member = sqlx::query_as::<_, Member>(
            "INSERT INTO members (user_id, membership_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user.id)
        .bind(Member::membership_id_for(user.id))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((user, member))
    }

    /// Create a staff account; staff accounts have no member record
    pub async fn create_staff(&self, username: &str, password_hash: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, is_staff)
            VALUES ($1, $2, TRUE)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_username)?;
        Ok(user)
    }
}

fn duplicate_username(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Validation("username: A user with that username already exists.".to_string())
    } else {
        AppError::Database(err)
    }
}
