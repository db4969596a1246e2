//! Admin dashboard routes.
//!
//! Everything here sits behind the `RequireAdmin` extractor. Handlers stay
//! thin: look up, mutate through a repository, wrap in the envelope.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use moostyle_core::{Role, UserId};

use crate::db::carts::CartRepository;
use crate::db::transactions::TransactionRepository;
use crate::db::users::{AdminUserUpdate, UserRepository, UserStats};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, audit::AuditEvent, metrics::MetricsSnapshot};
use crate::models::cart::Cart;
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::models::transaction::PointTransaction;
use crate::response::ApiResponse;
use crate::routes::auth::UserProfile;
use crate::routes::user::Pagination;
use crate::services::recovery::{self, DrillReport, RecoveryError, Runbook};
use crate::state::AppState;

/// GET /api/admin/users
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(pagination): Query<Pagination>,
) -> Result<ApiResponse<Vec<UserProfile>>> {
    let (limit, offset) = pagination.limit_offset();
    let users = UserRepository::new(state.pool()).list(limit, offset).await?;

    Ok(ApiResponse::ok(
        "Users",
        users.into_iter().map(UserProfile::from).collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// `true` bans (with `ban_reason`), `false` unbans, absent leaves as-is.
    pub banned: Option<bool>,
    pub ban_reason: Option<String>,
}

/// Authorization rules for admin edits.
///
/// Only an owner may change roles or touch another owner's account, and
/// nobody may ban or deactivate themselves.
fn authorize_update(
    admin: &CurrentUser,
    target: &User,
    payload: &AdminUpdateUserRequest,
) -> Result<()> {
    if payload.role.is_some() && admin.role != Role::Owner {
        return Err(AppError::Forbidden(
            "only the owner can change roles".to_string(),
        ));
    }
    if target.role == Role::Owner && admin.role != Role::Owner {
        return Err(AppError::Forbidden(
            "owner accounts can only be modified by an owner".to_string(),
        ));
    }
    if target.id == admin.id && (payload.is_active == Some(false) || payload.banned == Some(true)) {
        return Err(AppError::BadRequest(
            "You cannot ban or deactivate your own account".to_string(),
        ));
    }
    Ok(())
}

/// PATCH /api/admin/users/{id}
///
/// Role changes are restricted: only an owner may grant or revoke admin,
/// and owner accounts cannot be banned or deactivated by non-owners.
///
/// # Errors
///
/// Returns 403 when the caller lacks the required role, 404 for an unknown
/// user.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<ApiResponse<UserProfile>> {
    let target = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    authorize_update(&admin, &target, &payload)?;

    let ban = match payload.banned {
        Some(true) => Some(Some(
            payload
                .ban_reason
                .unwrap_or_else(|| "banned by admin".to_string()),
        )),
        Some(false) => Some(None),
        None => None,
    };

    let update = AdminUserUpdate {
        role: payload.role,
        is_active: payload.is_active,
        ban,
    };

    let user = UserRepository::new(state.pool())
        .admin_update(id, &update)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound(format!("user {id}")),
            other => AppError::Database(other),
        })?;

    tracing::info!(admin_id = %admin.id, user_id = %id, "admin updated user");

    Ok(ApiResponse::ok("User updated", user.into()))
}

/// GET /api/admin/users/{id}/transactions
///
/// # Errors
///
/// Returns 404 for an unknown user.
pub async fn user_transactions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<UserId>,
    Query(pagination): Query<Pagination>,
) -> Result<ApiResponse<Vec<PointTransaction>>> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    let (limit, offset) = pagination.limit_offset();
    let history = TransactionRepository::new(state.pool())
        .list_for_user(id, limit, offset)
        .await?;

    Ok(ApiResponse::ok("Point history", history))
}

/// GET /api/admin/carts
///
/// Every cart that currently has items.
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list_carts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ApiResponse<Vec<Cart>>> {
    let carts = CartRepository::new(state.pool()).list_active().await?;
    Ok(ApiResponse::ok("Active carts", carts))
}

/// DELETE /api/admin/users/{id}/cart
///
/// # Errors
///
/// Returns 404 for an unknown user.
pub async fn clear_user_cart(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<ApiResponse<Cart>> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    let cart = CartRepository::new(state.pool()).clear(id).await?;
    tracing::info!(admin_id = %admin.id, user_id = %id, "admin cleared cart");

    Ok(ApiResponse::ok("Cart cleared", cart))
}

/// GET /api/admin/stats
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ApiResponse<UserStats>> {
    let stats = UserRepository::new(state.pool()).stats().await?;
    Ok(ApiResponse::ok("Store stats", stats))
}

#[derive(Debug, Deserialize)]
pub struct TailQuery {
    #[serde(default = "default_tail")]
    pub limit: usize,
}

const fn default_tail() -> usize {
    100
}

/// GET /api/admin/security/events
///
/// The most recent entries of the append-only security log.
///
/// # Errors
///
/// Returns 500 if the log cannot be read.
pub async fn security_events(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<TailQuery>,
) -> Result<ApiResponse<Vec<AuditEvent>>> {
    let limit = query.limit.min(1000);
    let events = state
        .security_log()
        .tail(limit)
        .map_err(|e| AppError::Internal(format!("security log: {e}")))?;

    Ok(ApiResponse::ok("Security events", events))
}

/// GET /api/admin/security/metrics
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn security_metrics(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ApiResponse<MetricsSnapshot>> {
    Ok(ApiResponse::ok("Request metrics", state.metrics().snapshot()))
}

/// GET /api/admin/recovery
///
/// The incident runbook catalog.
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list_runbooks(
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ApiResponse<Vec<Runbook>>> {
    Ok(ApiResponse::ok("Runbooks", recovery::RUNBOOKS.to_vec()))
}

/// POST /api/admin/recovery/{slug}/drill
///
/// Execute a simulated recovery drill.
///
/// # Errors
///
/// Returns 404 for an unknown incident slug.
pub async fn run_drill(
    RequireAdmin(admin): RequireAdmin,
    Path(slug): Path<String>,
) -> Result<ApiResponse<DrillReport>> {
    let report = recovery::run_drill(&slug).await.map_err(|e| match e {
        RecoveryError::UnknownIncident(slug) => AppError::NotFound(format!("incident {slug}")),
    })?;

    tracing::info!(admin_id = %admin.id, incident = %slug, "recovery drill executed");

    Ok(ApiResponse::ok("Drill complete", report))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use moostyle_core::Email;

    fn caller(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: format!("caller-{id}@moostyle.example"),
            role,
        }
    }

    fn account(id: i32, role: Role) -> User {
        User {
            id: UserId::new(id),
            email: Email::parse(&format!("target-{id}@moostyle.example")).unwrap(),
            display_name: format!("Target {id}"),
            role,
            is_active: true,
            email_verified: true,
            points: 0,
            last_download_at: None,
            banned_at: None,
            ban_reason: None,
            notify_restock: false,
            notify_newsletter: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(
        role: Option<Role>,
        is_active: Option<bool>,
        banned: Option<bool>,
    ) -> AdminUpdateUserRequest {
        AdminUpdateUserRequest {
            role,
            is_active,
            banned,
            ban_reason: None,
        }
    }

    #[test]
    fn test_admin_cannot_ban_owner() {
        let err = authorize_update(
            &caller(2, Role::Admin),
            &account(1, Role::Owner),
            &request(None, None, Some(true)),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_admin_cannot_deactivate_owner() {
        let err = authorize_update(
            &caller(2, Role::Admin),
            &account(1, Role::Owner),
            &request(None, Some(false), None),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_owner_can_ban_admin() {
        let result = authorize_update(
            &caller(1, Role::Owner),
            &account(2, Role::Admin),
            &request(None, None, Some(true)),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_admin_can_ban_regular_user() {
        let result = authorize_update(
            &caller(2, Role::Admin),
            &account(3, Role::User),
            &request(None, None, Some(true)),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_only_owner_changes_roles() {
        let err = authorize_update(
            &caller(2, Role::Admin),
            &account(3, Role::User),
            &request(Some(Role::Admin), None, None),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_nobody_bans_themselves() {
        let err = authorize_update(
            &caller(1, Role::Owner),
            &account(1, Role::Owner),
            &request(None, None, Some(true)),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
