//! Point transaction domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use moostyle_core::{MembershipLevel, TransactionId, UserId};

/// An immutable record of a point-awarding download.
///
/// Rows are append-only: nothing in the codebase updates or deletes them.
#[derive(Debug, Clone, Serialize)]
pub struct PointTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    /// Number of mods in the downloaded cart.
    pub item_count: i32,
    /// Points credited by this download (2 per item).
    pub points_awarded: i32,
    pub points_before: i32,
    pub points_after: i32,
    pub level_before: MembershipLevel,
    pub level_after: MembershipLevel,
    /// Client IP of the download request.
    pub requester_ip: String,
    pub created_at: DateTime<Utc>,
}

impl PointTransaction {
    /// Whether this award crossed a tier boundary.
    #[must_use]
    pub fn is_level_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_level_up() {
        let tx = PointTransaction {
            id: TransactionId::new(1),
            user_id: UserId::new(1),
            item_count: 3,
            points_awarded: 6,
            points_before: 28,
            points_after: 34,
            level_before: MembershipLevel::Bronze,
            level_after: MembershipLevel::Silver,
            requester_ip: "203.0.113.7".to_string(),
            created_at: Utc::now(),
        };
        assert!(tx.is_level_up());

        let flat = PointTransaction {
            points_before: 0,
            points_after: 6,
            level_after: MembershipLevel::Bronze,
            ..tx
        };
        assert!(!flat.is_level_up());
    }
}
