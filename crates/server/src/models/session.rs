//! Session data types and keys.

use serde::{Deserialize, Serialize};

use moostyle_core::{Role, UserId};

/// Keys used to store data in the session.
pub mod session_keys {
    /// The authenticated user (`CurrentUser`).
    pub const CURRENT_USER: &str = "current_user";
}

/// The authenticated user stored in the session.
///
/// Holds just enough to authorize requests; profile data is fetched fresh
/// from the database when needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}
