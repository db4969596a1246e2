//! User repository.
//!
//! Queries are runtime-checked (`sqlx::query_as`) so the workspace builds
//! without a live database; row structs convert into domain types and
//! report invalid stored values as `DataCorruption`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use moostyle_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::user::User;

/// Database row for `users`.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    password_hash: String,
    display_name: String,
    role: String,
    is_active: bool,
    email_verified: bool,
    points: i32,
    last_download_at: Option<DateTime<Utc>>,
    banned_at: Option<DateTime<Utc>>,
    ban_reason: Option<String>,
    notify_restock: bool,
    notify_newsletter: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, is_active, \
     email_verified, points, last_download_at, banned_at, ban_reason, \
     notify_restock, notify_newsletter, created_at, updated_at";

impl UserRow {
    fn into_domain(self) -> Result<(User, String), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role: Role = self
            .role
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid role: {e}")))?;

        Ok((
            User {
                id: UserId::new(self.id),
                email,
                display_name: self.display_name,
                role,
                is_active: self.is_active,
                email_verified: self.email_verified,
                points: self.points,
                last_download_at: self.last_download_at,
                banned_at: self.banned_at,
                ban_reason: self.ban_reason,
                notify_restock: self.notify_restock,
                notify_newsletter: self.notify_newsletter,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.password_hash,
        ))
    }
}

/// Fields an admin may change on a user.
#[derive(Debug, Default, Clone)]
pub struct AdminUserUpdate {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// `Some(Some(reason))` bans, `Some(None)` unbans, `None` leaves as-is.
    pub ban: Option<Option<String>>,
}

/// Aggregate numbers for the admin stats endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub banned_users: i64,
    pub total_points: i64,
    pub total_downloads: i64,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if stored values are invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_domain().map(|(user, _)| user)).transpose()
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_domain().map(|(user, _)| user)).transpose()
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_auth_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_domain).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        display_name: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, password_hash, display_name, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .bind(display_name)
        .bind(role.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_domain().map(|(user, _)| user)
    }

    /// Update profile fields the user controls.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        display_name: Option<&str>,
        notify_restock: Option<bool>,
        notify_newsletter: Option<bool>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                 display_name = COALESCE($2, display_name), \
                 notify_restock = COALESCE($3, notify_restock), \
                 notify_newsletter = COALESCE($4, notify_newsletter), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(display_name)
        .bind(notify_restock)
        .bind(notify_newsletter)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.into_domain().map(|(user, _)| user)
    }

    /// Mark a user's email as verified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_email_verified(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = now() WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a fresh verification code for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_verification_code(
        &self,
        user_id: UserId,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO email_verification_codes (user_id, code, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id.as_i32())
        .bind(code)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Consume an unexpired, unconsumed verification code.
    ///
    /// Returns `true` if a matching code was consumed. Expiry is checked in
    /// the same statement so a code cannot be consumed twice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn consume_verification_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE email_verification_codes \
             SET consumed_at = now() \
             WHERE user_id = $1 AND code = $2 \
               AND consumed_at IS NULL AND expires_at > now()",
        )
        .bind(user_id.as_i32())
        .bind(code)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether an unconsumed but expired code exists (for a precise error).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_expired_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT id FROM email_verification_codes \
             WHERE user_id = $1 AND code = $2 \
               AND consumed_at IS NULL AND expires_at <= now() \
             LIMIT 1",
        )
        .bind(user_id.as_i32())
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// List users for the admin dashboard, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.into_domain().map(|(user, _)| user))
            .collect()
    }

    /// Apply an admin edit (role, active flag, ban state).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn admin_update(
        &self,
        id: UserId,
        update: &AdminUserUpdate,
    ) -> Result<User, RepositoryError> {
        // ban: NULL bind means "leave alone"; handled via the flag columns
        let (set_ban, ban_reason) = match &update.ban {
            None => (false, None),
            Some(reason) => (true, reason.clone()),
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                 role = COALESCE($2, role), \
                 is_active = COALESCE($3, is_active), \
                 banned_at = CASE WHEN $4 THEN \
                     CASE WHEN $5::text IS NULL THEN NULL ELSE now() END \
                     ELSE banned_at END, \
                 ban_reason = CASE WHEN $4 THEN $5 ELSE ban_reason END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(update.role.map(|r| r.to_string()))
        .bind(update.is_active)
        .bind(set_ban)
        .bind(ban_reason)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.into_domain().map(|(user, _)| user)
    }

    /// Aggregate counts for the admin stats endpoint.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<UserStats, RepositoryError> {
        let row: (i64, i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
                 COUNT(*), \
                 COUNT(*) FILTER (WHERE is_active), \
                 COUNT(*) FILTER (WHERE banned_at IS NOT NULL), \
                 COALESCE(SUM(points), 0)::bigint, \
                 (SELECT COUNT(*) FROM point_transactions) \
             FROM users",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(UserStats {
            total_users: row.0,
            active_users: row.1,
            banned_users: row.2,
            total_points: row.3,
            total_downloads: row.4,
        })
    }
}
