//! Members repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::member::{Member, MemberForm, MemberProfile},
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Member record owned by a user account, if any
    pub async fn find_by_user(&self, user_id: i32) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    /// Member joined with its user identity
    pub async fn profile(&self, member_id: i32) -> AppResult<MemberProfile> {
        sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT m.id, m.membership_id, u.username, u.first_name, u.last_name, u.email,
                   m.phone, m.address, m.date_joined
            FROM members m
            JOIN users u ON u.id = m.user_id
            WHERE m.id = $1
            "#,
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", member_id)))
    }

    /// Update contact details
    pub async fn update(&self, member_id: i32, form: &MemberForm) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            "UPDATE members SET phone = $1, address = $2 WHERE id = $3 RETURNING *",
        )
        .bind(form.phone.trim())
        .bind(&form.address)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", member_id)))
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
