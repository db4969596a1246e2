//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. `TraceLayer` (request tracing)
//! 2. Request ID (unique ID per request)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Audit (security log + metrics + suspicious-pattern detection)
//! 5. Security headers
//! 6. Rate limiting (governor, per route group)

pub mod audit;
pub mod auth;
pub mod metrics;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use audit::{
    AuditEvent, SecurityLog, audit_middleware, client_ip, client_ip_from_headers, is_suspicious,
};
pub use auth::{RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use metrics::{MetricsSnapshot, RequestMetrics};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
