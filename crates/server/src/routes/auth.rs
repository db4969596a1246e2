//! Authentication routes.
//!
//! Registration issues an email verification code; login stores a
//! `CurrentUser` in the `PostgreSQL`-backed session.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use moostyle_core::{MembershipLevel, Role, UserId};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub email_verified: bool,
    pub points: i32,
    pub membership_level: MembershipLevel,
    pub points_to_next_level: Option<i32>,
    pub last_download_at: Option<DateTime<Utc>>,
    pub notify_restock: bool,
    pub notify_newsletter: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let level = user.membership_level();
        Self {
            id: user.id,
            email: user.email.to_string(),
            display_name: user.display_name,
            role: user.role,
            email_verified: user.email_verified,
            points: user.points,
            membership_level: level,
            points_to_next_level: level.points_to_next(user.points),
            last_download_at: user.last_download_at,
            notify_restock: user.notify_restock,
            notify_newsletter: user.notify_newsletter,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// POST /api/auth/register
///
/// Creates the account and emails a verification code. The user is not
/// logged in until the email is verified and they log in.
///
/// # Errors
///
/// Returns 400 for invalid email or weak password, 409 if the email is
/// already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<UserProfile>)> {
    let auth = AuthService::new(state.pool());
    let (user, code) = auth
        .register(&payload.email, &payload.password, &payload.display_name)
        .await?;

    if let Err(e) = state
        .email()
        .send_verification_code(user.email.as_str(), &code)
        .await
    {
        // The account exists; the user can request a new code.
        tracing::error!(error = %e, email = %user.email, "failed to send verification code");
    }

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            "Account created, check your email for a verification code",
            user.into(),
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// POST /api/auth/verify-email
///
/// # Errors
///
/// Returns 400 for an invalid or expired code.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<ApiResponse<UserProfile>> {
    let auth = AuthService::new(state.pool());
    let user = auth.verify_email(&payload.email, &payload.code).await?;

    Ok(ApiResponse::ok("Email verified", user.into()))
}

#[derive(Debug, Deserialize)]
pub struct ResendCodeRequest {
    pub email: String,
}

/// POST /api/auth/resend-code
///
/// Always replies with the same message so the endpoint cannot be used to
/// probe which emails are registered.
///
/// # Errors
///
/// Returns 500 only on infrastructure failure.
pub async fn resend_code(
    State(state): State<AppState>,
    Json(payload): Json<ResendCodeRequest>,
) -> Result<ApiResponse<()>> {
    let auth = AuthService::new(state.pool());

    if let Ok(user) = auth.get_user_by_email(&payload.email).await
        && !user.email_verified
    {
        let code = auth.issue_verification_code(user.id).await?;
        if let Err(e) = state
            .email()
            .send_verification_code(user.email.as_str(), &code)
            .await
        {
            tracing::error!(error = %e, email = %user.email, "failed to resend verification code");
        }
    }

    Ok(ApiResponse::message(
        "If that account exists, a new code has been sent",
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for bad credentials or a blocked account.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<UserProfile>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&payload.email, &payload.password).await?;

    // Fresh session ID on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let current = CurrentUser {
        id: user.id,
        email: user.email.to_string(),
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::ok("Logged in", user.into()))
}

/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<ApiResponse<()>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(ApiResponse::message("Logged out"))
}

/// GET /api/auth/me
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<ApiResponse<UserProfile>> {
    let auth = AuthService::new(state.pool());
    let user = auth.get_user(current.id).await?;

    Ok(ApiResponse::ok("Current user", user.into()))
}
