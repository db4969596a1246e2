//! Core types for MooStyle.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod membership;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use membership::{DOWNLOAD_COOLDOWN_SECONDS, MembershipLevel, POINTS_PER_ITEM};
pub use role::Role;
