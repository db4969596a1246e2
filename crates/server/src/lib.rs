//! MooStyle API server library.
//!
//! Backend for the MooStyle storefront: accounts with email verification,
//! per-user carts of downloadable fashion mods, a points/membership rewards
//! program, security auditing, and admin tooling. Exposed as a library so
//! the CLI can reuse the repositories and migrations, and so integration
//! tests can build the router in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
