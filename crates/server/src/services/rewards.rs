//! Rewards service: the atomic cart-download flow.
//!
//! A successful download, in one database transaction:
//!
//! 1. Lock the user row (`SELECT ... FOR UPDATE`) - the lock serializes
//!    concurrent downloads from the same user, so the cooldown check below
//!    cannot race and double-award.
//! 2. Reject if a download happened within the last 5 minutes.
//! 3. Load the cart lines; reject an empty or absurdly large cart.
//! 4. Credit 2 points per item and stamp `last_download_at`.
//! 5. Append exactly one `point_transactions` row.
//! 6. Clear the cart.
//!
//! Any step failing aborts the whole transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use moostyle_core::{DOWNLOAD_COOLDOWN_SECONDS, MembershipLevel, POINTS_PER_ITEM, UserId};

use crate::db::RepositoryError;
use crate::db::transactions::TransactionRow;
use crate::models::transaction::PointTransaction;

/// Largest cart accepted by a single download.
const MAX_DOWNLOAD_ITEMS: i64 = 100;

/// Errors that can occur during a cart download.
#[derive(Debug, Error)]
pub enum RewardsError {
    /// The cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// The cart's item count is implausibly large.
    #[error("too many items: {count}")]
    TooManyItems { count: i64 },

    /// A download happened within the cooldown window.
    #[error("download cooldown active, retry in {retry_after_seconds}s")]
    Cooldown { retry_after_seconds: i64 },

    /// No such user.
    #[error("user not found")]
    UserNotFound,

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for RewardsError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Rewards service.
pub struct RewardsService<'a> {
    pool: &'a PgPool,
}

impl<'a> RewardsService<'a> {
    /// Create a new rewards service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Execute the atomic download flow for a user's cart.
    ///
    /// Returns the appended point transaction on success.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::Cooldown` if the user downloaded within the
    /// last 5 minutes, `EmptyCart`/`TooManyItems` for bad carts, or
    /// `Repository` if any statement fails (the transaction rolls back).
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn download_cart(
        &self,
        user_id: UserId,
        requester_ip: &str,
    ) -> Result<PointTransaction, RewardsError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Lock the user row for the duration of the transaction.
        let user: Option<(i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT points, last_download_at FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        let (points_before, last_download_at) = user.ok_or(RewardsError::UserNotFound)?;

        if let Some(retry_after_seconds) = cooldown_remaining(last_download_at, now) {
            return Err(RewardsError::Cooldown {
                retry_after_seconds,
            });
        }

        let (item_count,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(ci.quantity), 0)::bigint \
             FROM cart_items ci \
             JOIN carts c ON c.id = ci.cart_id \
             WHERE c.user_id = $1",
        )
        .bind(user_id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        if item_count == 0 {
            return Err(RewardsError::EmptyCart);
        }
        if item_count > MAX_DOWNLOAD_ITEMS {
            return Err(RewardsError::TooManyItems { count: item_count });
        }

        #[allow(clippy::cast_possible_truncation)] // item_count <= MAX_DOWNLOAD_ITEMS
        let item_count = item_count as i32;
        let points_awarded = points_for(item_count);
        let points_after = points_before + points_awarded;

        let level_before = MembershipLevel::from_points(points_before);
        let level_after = MembershipLevel::from_points(points_after);

        sqlx::query("UPDATE users SET points = $2, last_download_at = $3, updated_at = $3 WHERE id = $1")
            .bind(user_id.as_i32())
            .bind(points_after)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, TransactionRow>(
            "INSERT INTO point_transactions \
                 (user_id, item_count, points_awarded, points_before, points_after, \
                  level_before, level_after, requester_ip, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, user_id, item_count, points_awarded, points_before, \
                       points_after, level_before, level_after, requester_ip, created_at",
        )
        .bind(user_id.as_i32())
        .bind(item_count)
        .bind(points_awarded)
        .bind(points_before)
        .bind(points_after)
        .bind(level_before.to_string())
        .bind(level_after.to_string())
        .bind(requester_ip)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM cart_items ci \
             USING carts c \
             WHERE ci.cart_id = c.id AND c.user_id = $1",
        )
        .bind(user_id.as_i32())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let transaction = row.into_domain()?;
        tracing::info!(
            user_id = %user_id,
            points_awarded,
            points_after,
            level = %level_after,
            "cart downloaded"
        );

        Ok(transaction)
    }
}

/// Points awarded for downloading `item_count` mods.
const fn points_for(item_count: i32) -> i32 {
    POINTS_PER_ITEM * item_count
}

/// Seconds left on the cooldown, or `None` when a download is allowed.
///
/// Exactly at the boundary (5 minutes elapsed) a download is allowed.
fn cooldown_remaining(last_download_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let last = last_download_at?;
    let elapsed = (now - last).num_seconds();
    let remaining = DOWNLOAD_COOLDOWN_SECONDS - elapsed;
    (remaining > 0).then_some(remaining)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_points_for() {
        assert_eq!(points_for(1), 2);
        assert_eq!(points_for(3), 6);
        assert_eq!(points_for(100), 200);
    }

    #[test]
    fn test_cooldown_no_prior_download() {
        assert_eq!(cooldown_remaining(None, Utc::now()), None);
    }

    #[test]
    fn test_cooldown_inside_window() {
        let now = Utc::now();
        let last = now - Duration::seconds(60);
        assert_eq!(cooldown_remaining(Some(last), now), Some(240));
    }

    #[test]
    fn test_cooldown_at_boundary_allows() {
        let now = Utc::now();
        let last = now - Duration::seconds(DOWNLOAD_COOLDOWN_SECONDS);
        assert_eq!(cooldown_remaining(Some(last), now), None);
    }

    #[test]
    fn test_cooldown_just_inside_window() {
        let now = Utc::now();
        let last = now - Duration::seconds(DOWNLOAD_COOLDOWN_SECONDS - 1);
        assert_eq!(cooldown_remaining(Some(last), now), Some(1));
    }

    #[test]
    fn test_cooldown_long_ago() {
        let now = Utc::now();
        let last = now - Duration::hours(2);
        assert_eq!(cooldown_remaining(Some(last), now), None);
    }

    #[test]
    fn test_three_item_download_from_zero_points() {
        // 0 points, 3 items: award 6 points, stay Bronze
        let awarded = points_for(3);
        assert_eq!(awarded, 6);
        assert_eq!(MembershipLevel::from_points(awarded), MembershipLevel::Bronze);
    }
}
