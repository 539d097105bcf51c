//! Mercado Pago REST client implementation.

use secrecy::{ExposeSecret, SecretString};

use crate::config::MercadoPagoConfig;

use super::MercadoPagoError;
use super::types::{PaymentInfo, PreferenceRequest, PreferenceResponse, WebhookNotification};

/// Mercado Pago API base URL.
const BASE_URL: &str = "https://api.mercadopago.com";

/// Client for the Mercado Pago Checkout Pro API.
#[derive(Clone)]
pub struct MercadoPagoClient {
    client: reqwest::Client,
    access_token: SecretString,
    public_key: String,
}

impl std::fmt::Debug for MercadoPagoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoClient")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl MercadoPagoClient {
    /// Create a new Mercado Pago API client.
    #[must_use]
    pub fn new(config: &MercadoPagoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: config.access_token.clone(),
            public_key: config.public_key.clone(),
        }
    }

    /// The public key the checkout page hands to the gateway's JS widget.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Create a checkout preference for a cart.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the gateway rejects the
    /// preference.
    pub async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<PreferenceResponse, MercadoPagoError> {
        let url = format!("{BASE_URL}/checkout/preferences");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MercadoPagoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let preference: PreferenceResponse = response
            .json()
            .await
            .map_err(|e| MercadoPagoError::Parse(e.to_string()))?;

        tracing::info!(
            preference_id = %preference.id,
            external_reference = %request.external_reference,
            "Created Mercado Pago preference"
        );

        Ok(preference)
    }

    /// Fetch a payment to verify its state server-side.
    ///
    /// The redirect back from the hosted checkout and the webhook both
    /// carry only a payment id; the authoritative status comes from here.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the payment does not exist, or
    /// the response cannot be parsed.
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentInfo, MercadoPagoError> {
        let url = format!(
            "{BASE_URL}/v1/payments/{}",
            urlencoding::encode(payment_id)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?;
        let status = response.status();

        if status.as_u16() == 404 {
            return Err(MercadoPagoError::PaymentNotFound(payment_id.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MercadoPagoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| MercadoPagoError::Parse(e.to_string()))
    }

    /// Resolve the payment a webhook notification refers to.
    ///
    /// Returns `Ok(None)` for topics other than `payment` and for bodies
    /// without a usable payment id; the webhook endpoint acknowledges
    /// those without further work.
    ///
    /// # Errors
    ///
    /// Returns error if the payment lookup fails.
    pub async fn resolve_webhook_payment(
        &self,
        notification: &WebhookNotification,
    ) -> Result<Option<PaymentInfo>, MercadoPagoError> {
        if notification.topic() != Some("payment") {
            return Ok(None);
        }

        let Some(payment_id) = notification.payment_id() else {
            return Ok(None);
        };

        self.get_payment(&payment_id).await.map(Some)
    }
}
