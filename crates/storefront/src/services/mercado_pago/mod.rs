//! Mercado Pago Checkout Pro client.
//!
//! # Architecture
//!
//! - Card data never touches this server: checkout renders the hosted
//!   payment widget against a *preference* created here, and Mercado Pago
//!   redirects back with a payment id we verify server-side
//! - REST JSON over `reqwest`, bearer-authenticated with the access token
//! - Amounts travel as plain JSON numbers in `COP`
//!
//! # Endpoints
//!
//! - `POST /checkout/preferences` creates the preference for a cart
//! - `GET /v1/payments/{id}` verifies a payment after the return redirect
//!   or a webhook notification

mod client;
pub mod types;

pub use client::MercadoPagoClient;
pub use types::{
    BackUrls, PayerAddress, PayerIdentification, PayerPhone, PaymentInfo, PaymentMethods,
    PreferenceItem, PreferencePayer, PreferenceRequest, PreferenceResponse, WebhookNotification,
};

use thiserror::Error;

/// Errors that can occur when interacting with the Mercado Pago API.
#[derive(Debug, Error)]
pub enum MercadoPagoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = MercadoPagoError::Api {
            status: 400,
            message: "invalid access token".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 400 - invalid access token");
    }

    #[test]
    fn test_payment_not_found_display() {
        let err = MercadoPagoError::PaymentNotFound("12345".to_string());
        assert_eq!(err.to_string(), "Payment not found: 12345");
    }
}
