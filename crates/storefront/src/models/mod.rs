//! Domain models for the storefront.
//!
//! Validated domain objects, separate from the database row types that
//! the repositories convert from.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod session;
pub mod user;
