//! Domain types for the back-office.

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod requests;
pub mod session;
pub mod staff;
pub mod users;

pub use session::{CurrentStaff, keys as session_keys};
pub use staff::{PermissionSet, Section};
