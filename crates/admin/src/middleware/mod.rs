//! HTTP middleware stack for the back-office.
//!
//! Thinner than the storefront's: the panel sits behind staff logins on a
//! private port, so there is no rate limiting or request-id layer, just
//! sessions and the auth extractors.

pub mod auth;
pub mod session;

pub use auth::{RequireStaff, clear_current_staff, ensure_section, set_current_staff};
pub use session::create_session_layer;
