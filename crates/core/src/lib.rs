//! MooStyle Core - Shared types library.
//!
//! This crate provides common types used across all MooStyle components:
//! - `server` - JSON API serving the storefront, cart, rewards, and admin endpoints
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, and membership tiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
