//! Service layer for outbound concerns.

pub mod email;

pub use email::{EmailError, EmailService};
