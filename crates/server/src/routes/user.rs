//! Account routes: points, point history, profile.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use moostyle_core::MembershipLevel;

use crate::db::transactions::TransactionRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::transaction::PointTransaction;
use crate::response::ApiResponse;
use crate::routes::auth::UserProfile;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Standard page-based pagination query.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

const fn default_page() -> i64 {
    1
}

const fn default_per_page() -> i64 {
    20
}

impl Pagination {
    /// Clamped limit/offset pair.
    #[must_use]
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, 100);
        let page = self.page.max(1);
        (per_page, (page - 1) * per_page)
    }
}

/// Point balance summary.
#[derive(Debug, Serialize)]
pub struct PointsSummary {
    pub points: i32,
    pub membership_level: MembershipLevel,
    pub next_level: Option<MembershipLevel>,
    pub points_to_next_level: Option<i32>,
    pub last_download_at: Option<DateTime<Utc>>,
}

/// GET /api/user/points
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn points(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<ApiResponse<PointsSummary>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    let level = user.membership_level();

    Ok(ApiResponse::ok(
        "Point balance",
        PointsSummary {
            points: user.points,
            membership_level: level,
            next_level: level.next(),
            points_to_next_level: level.points_to_next(user.points),
            last_download_at: user.last_download_at,
        },
    ))
}

/// GET /api/user/transactions
///
/// Point history, newest first.
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn transactions(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(pagination): Query<Pagination>,
) -> Result<ApiResponse<Vec<PointTransaction>>> {
    let (limit, offset) = pagination.limit_offset();
    let history = TransactionRepository::new(state.pool())
        .list_for_user(current.id, limit, offset)
        .await?;

    Ok(ApiResponse::ok("Point history", history))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub notify_restock: Option<bool>,
    pub notify_newsletter: Option<bool>,
}

/// PATCH /api/user/profile
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<UserProfile>> {
    let user = UserRepository::new(state.pool())
        .update_profile(
            current.id,
            payload.display_name.as_deref(),
            payload.notify_restock,
            payload.notify_newsletter,
        )
        .await?;

    Ok(ApiResponse::ok("Profile updated", user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination {
            page: default_page(),
            per_page: default_per_page(),
        };
        assert_eq!(p.limit_offset(), (20, 0));
    }

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination {
            page: 0,
            per_page: 10_000,
        };
        assert_eq!(p.limit_offset(), (100, 0));

        let p = Pagination {
            page: 3,
            per_page: 25,
        };
        assert_eq!(p.limit_offset(), (25, 50));
    }
}
