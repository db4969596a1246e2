//! User and catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use moostyle_core::{Email, MembershipLevel, ProductId, Role, UserId};

/// A MooStyle account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name shown in the storefront.
    pub display_name: String,
    /// Account role.
    pub role: Role,
    /// Whether the account is active (admin-togglable).
    pub is_active: bool,
    /// Whether the email has been verified.
    pub email_verified: bool,
    /// Current reward point balance.
    pub points: i32,
    /// Timestamp of the last successful cart download.
    pub last_download_at: Option<DateTime<Utc>>,
    /// When the account was banned, if it is.
    pub banned_at: Option<DateTime<Utc>>,
    /// Reason supplied when the ban was applied.
    pub ban_reason: Option<String>,
    /// Wants restock notifications.
    pub notify_restock: bool,
    /// Wants the newsletter.
    pub notify_newsletter: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The membership tier for this user's current point balance.
    #[must_use]
    pub const fn membership_level(&self) -> MembershipLevel {
        MembershipLevel::from_points(self.points)
    }

    /// Whether the account is banned.
    #[must_use]
    pub const fn is_banned(&self) -> bool {
        self.banned_at.is_some()
    }
}

/// A downloadable mod in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    /// URL-safe unique handle (e.g., "pastel-streetwear-pack").
    pub handle: String,
    pub title: String,
    pub category: String,
    pub price: Decimal,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_user(points: i32) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("shopper@moostyle.example").unwrap(),
            display_name: "Shopper".to_string(),
            role: Role::User,
            is_active: true,
            email_verified: true,
            points,
            last_download_at: None,
            banned_at: None,
            ban_reason: None,
            notify_restock: true,
            notify_newsletter: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_membership_level_follows_points() {
        assert_eq!(sample_user(0).membership_level(), MembershipLevel::Bronze);
        assert_eq!(sample_user(45).membership_level(), MembershipLevel::Silver);
        assert_eq!(sample_user(250).membership_level(), MembershipLevel::Diamond);
    }

    #[test]
    fn test_is_banned() {
        let mut user = sample_user(0);
        assert!(!user.is_banned());
        user.banned_at = Some(Utc::now());
        assert!(user.is_banned());
    }
}
