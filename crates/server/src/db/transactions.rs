//! Point transaction repository (read side).
//!
//! Inserts happen inside the rewards service's database transaction; this
//! repository only reads. The table is append-only by construction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use moostyle_core::{MembershipLevel, TransactionId, UserId};

use super::RepositoryError;
use crate::models::transaction::PointTransaction;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    id: i32,
    user_id: i32,
    item_count: i32,
    points_awarded: i32,
    points_before: i32,
    points_after: i32,
    level_before: String,
    level_after: String,
    requester_ip: String,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    pub(crate) fn into_domain(self) -> Result<PointTransaction, RepositoryError> {
        let level_before: MembershipLevel = self.level_before.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid membership level: {e}"))
        })?;
        let level_after: MembershipLevel = self.level_after.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid membership level: {e}"))
        })?;

        Ok(PointTransaction {
            id: TransactionId::new(self.id),
            user_id: UserId::new(self.user_id),
            item_count: self.item_count,
            points_awarded: self.points_awarded,
            points_before: self.points_before,
            points_after: self.points_after,
            level_before,
            level_after,
            requester_ip: self.requester_ip,
            created_at: self.created_at,
        })
    }
}

const TX_COLUMNS: &str = "id, user_id, item_count, points_awarded, points_before, \
     points_after, level_before, level_after, requester_ip, created_at";

/// Repository for reading the point audit trail.
pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    /// Create a new transaction repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's point history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PointTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TX_COLUMNS} FROM point_transactions \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_i32())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }
}
