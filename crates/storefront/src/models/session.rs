//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use liher_core::{Email, UserId};

use crate::models::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Given name, for greeting in the header.
    pub first_name: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
        }
    }
}

/// Session keys for authentication and checkout data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous cart id.
    pub const CART_ID: &str = "carrito_id";

    /// Key for the identification captured in checkout step one.
    pub const IDENTIFICATION_ID: &str = "identificacion_id";

    /// Key for the shipping address chosen in checkout step two.
    pub const SHIPPING_ID: &str = "envio_id";

    /// Key for the running checkout totals.
    pub const CHECKOUT_TOTALS: &str = "checkout_totals";

    /// Key for the Mercado Pago preference created for this checkout.
    pub const PREFERENCE_ID: &str = "preference_id";

    /// Key for the email confirmed on the password-reset form.
    pub const RESET_EMAIL: &str = "reset_email";
}
