//! Membership tiers derived from reward points.
//!
//! Points are the reward currency credited when a shopper downloads the
//! mods in their cart. The membership level is always a pure function of
//! the current point total - it is never stored independently.

use serde::{Deserialize, Serialize};

/// Points credited per mod downloaded.
pub const POINTS_PER_ITEM: i32 = 2;

/// Minimum seconds between successful cart downloads per user.
pub const DOWNLOAD_COOLDOWN_SECONDS: i64 = 5 * 60;

/// Membership tier derived from a user's cumulative points.
///
/// Tier thresholds:
///
/// | Tier    | Points  |
/// |---------|---------|
/// | Bronze  | 0-29    |
/// | Silver  | 30-79   |
/// | Gold    | 80-199  |
/// | Diamond | 200+    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipLevel {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

impl MembershipLevel {
    /// Minimum points required for Silver.
    pub const SILVER_THRESHOLD: i32 = 30;
    /// Minimum points required for Gold.
    pub const GOLD_THRESHOLD: i32 = 80;
    /// Minimum points required for Diamond.
    pub const DIAMOND_THRESHOLD: i32 = 200;

    /// Derive the membership level for a point total.
    ///
    /// Negative totals are clamped to Bronze; the schema forbids them, so a
    /// negative value here indicates corrupt input rather than a real tier.
    #[must_use]
    pub const fn from_points(points: i32) -> Self {
        if points >= Self::DIAMOND_THRESHOLD {
            Self::Diamond
        } else if points >= Self::GOLD_THRESHOLD {
            Self::Gold
        } else if points >= Self::SILVER_THRESHOLD {
            Self::Silver
        } else {
            Self::Bronze
        }
    }

    /// The next tier up, or `None` at Diamond.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Diamond),
            Self::Diamond => None,
        }
    }

    /// Points still needed to reach the next tier, or `None` at Diamond.
    #[must_use]
    pub const fn points_to_next(self, points: i32) -> Option<i32> {
        let threshold = match self {
            Self::Bronze => Self::SILVER_THRESHOLD,
            Self::Silver => Self::GOLD_THRESHOLD,
            Self::Gold => Self::DIAMOND_THRESHOLD,
            Self::Diamond => return None,
        };
        let remaining = threshold - points;
        Some(if remaining > 0 { remaining } else { 0 })
    }
}

impl std::fmt::Display for MembershipLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
            Self::Diamond => write!(f, "diamond"),
        }
    }
}

impl std::str::FromStr for MembershipLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "diamond" => Ok(Self::Diamond),
            _ => Err(format!("invalid membership level: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(MembershipLevel::from_points(0), MembershipLevel::Bronze);
        assert_eq!(MembershipLevel::from_points(29), MembershipLevel::Bronze);
        assert_eq!(MembershipLevel::from_points(30), MembershipLevel::Silver);
        assert_eq!(MembershipLevel::from_points(79), MembershipLevel::Silver);
        assert_eq!(MembershipLevel::from_points(80), MembershipLevel::Gold);
        assert_eq!(MembershipLevel::from_points(199), MembershipLevel::Gold);
        assert_eq!(MembershipLevel::from_points(200), MembershipLevel::Diamond);
        assert_eq!(MembershipLevel::from_points(5000), MembershipLevel::Diamond);
    }

    #[test]
    fn test_negative_points_clamp_to_bronze() {
        assert_eq!(MembershipLevel::from_points(-5), MembershipLevel::Bronze);
    }

    #[test]
    fn test_next_tier() {
        assert_eq!(
            MembershipLevel::Bronze.next(),
            Some(MembershipLevel::Silver)
        );
        assert_eq!(MembershipLevel::Gold.next(), Some(MembershipLevel::Diamond));
        assert_eq!(MembershipLevel::Diamond.next(), None);
    }

    #[test]
    fn test_points_to_next() {
        assert_eq!(MembershipLevel::Bronze.points_to_next(0), Some(30));
        assert_eq!(MembershipLevel::Bronze.points_to_next(28), Some(2));
        assert_eq!(MembershipLevel::Silver.points_to_next(30), Some(50));
        assert_eq!(MembershipLevel::Gold.points_to_next(199), Some(1));
        assert_eq!(MembershipLevel::Diamond.points_to_next(200), None);
    }

    #[test]
    fn test_ordering() {
        assert!(MembershipLevel::Bronze < MembershipLevel::Silver);
        assert!(MembershipLevel::Gold < MembershipLevel::Diamond);
    }

    #[test]
    fn test_display_from_str_roundtrip() {
        for level in [
            MembershipLevel::Bronze,
            MembershipLevel::Silver,
            MembershipLevel::Gold,
            MembershipLevel::Diamond,
        ] {
            let parsed: MembershipLevel = level.to_string().parse().unwrap();
            assert_eq!(parsed, level);
        }
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&MembershipLevel::Diamond).unwrap();
        assert_eq!(json, "\"diamond\"");
    }
}
