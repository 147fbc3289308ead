//! Users repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, User},
};

/// User persistence operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Lookup by already-normalized username
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;
    /// Lookup by already-normalized email
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn count(&self) -> AppResult<i64>;
    async fn create(&self, user: &NewUser) -> AppResult<User>;
    async fn update_profile(
        &self,
        id: Uuid,
        email: Option<String>,
        full_name: Option<String>,
    ) -> AppResult<User>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<User>;
    async fn update_last_login(&self, id: Uuid) -> AppResult<User>;
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<User>;
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("User {} not found", id))
    }
}

/// Turn a `UNIQUE` violation into a validation error, so a lost race with a
/// concurrent writer reads the same as the service-level duplicate check.
fn unique_violation(err: sqlx::Error, message: impl FnOnce(Option<&str>) -> String) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Validation(message(db.constraint()));
        }
    }
    AppError::Database(err)
}

/// Which of `users_username_key` / `users_email_key` was hit
fn duplicate_account_message(constraint: Option<&str>, user: &NewUser) -> String {
    match constraint {
        Some(name) if name.contains("email") => format!("Email '{}' already exists", user.email),
        _ => format!("Username '{}' already exists", user.username),
    }
}

#[async_trait]
impl UsersStore for UsersRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 LIMIT 1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*)::bigint FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, full_name,
                is_active, is_admin, created, updated
            ) VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.is_admin)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, |constraint| duplicate_account_message(constraint, user)))?;

        Ok(created)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        email: Option<String>,
        full_name: Option<String>,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                full_name = COALESCE($2, full_name),
                updated = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, |_| "Email already in use".to_string()))?
        .ok_or_else(|| Self::not_found(id))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET password_hash = $1, updated = $2 WHERE id = $3 RETURNING *",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))
    }

    async fn update_last_login(&self, id: Uuid) -> AppResult<User> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            "UPDATE users SET last_login = $1, updated = $1 WHERE id = $2 RETURNING *",
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $1, updated = $2 WHERE id = $3 RETURNING *",
        )
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))
    }
}
