//! # User Repository
//!
//! Database operations for user accounts.
//!
//! The password hash is only readable through [`UserRecord`], which the
//! auth service uses to verify logins. Every other read returns a plain
//! [`User`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::{Role, User};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    name: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A user together with its stored password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user: User {
                id: row.id,
                email: row.email,
                name: row.name,
                role: row.role,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        }
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists every user sorted by name; unnamed accounts last.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name IS NULL, name COLLATE NOCASE, email"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| UserRecord::from(row).user).collect())
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        Ok(self.get_record(id).await?.map(|record| record.user))
    }

    /// Gets a user and its password hash by ID.
    pub async fn get_record(&self, id: &str) -> DbResult<Option<UserRecord>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(UserRecord::from))
    }

    /// Finds a user by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn insert(&self, record: &UserRecord) -> DbResult<()> {
        let user = &record.user;
        debug!(id = %user.id, role = user.role.as_str(), "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&record.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes every mutable column of a user, including the hash.
    pub async fn update(&self, record: &UserRecord) -> DbResult<()> {
        let user = &record.user;
        debug!(id = %user.id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = ?2,
                password_hash = ?3,
                name = ?4,
                role = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&record.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user.id));
        }

        Ok(())
    }

    /// Deletes a user.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
