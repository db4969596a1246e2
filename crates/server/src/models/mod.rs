//! Domain models.
//!
//! These types represent validated domain objects separate from database
//! row types; the `db` layer converts rows into them.

pub mod cart;
pub mod session;
pub mod transaction;
pub mod user;

pub use cart::{Cart, CartItem};
pub use session::{CurrentUser, session_keys};
pub use transaction::PointTransaction;
pub use user::{Product, User};
