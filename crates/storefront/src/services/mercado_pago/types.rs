//! Wire types for the Mercado Pago Checkout Pro API.
//!
//! Field names follow the gateway's JSON exactly. Amounts are serialized
//! as plain numbers in `COP`; [`PreferenceItem::cop`] converts from
//! [`Money`] at the boundary.

use liher_core::{Money, PaymentStatus};
use serde::{Deserialize, Serialize};

/// A checkout preference to create.
///
/// One item per cart line, plus one line for shipping and, when a coupon
/// is applied, one line with a negative unit price for the discount.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub back_urls: BackUrls,
    /// Redirect automatically when the payment is approved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_return: Option<String>,
    /// Webhook endpoint. Omitted in local development, where the gateway
    /// cannot reach the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    pub payment_methods: PaymentMethods,
    pub statement_descriptor: String,
    pub external_reference: String,
    pub expires: bool,
}

/// A single line in a checkout preference.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub currency_id: String,
}

impl PreferenceItem {
    /// Build a peso-denominated line. A negative `unit_price` encodes a
    /// discount.
    #[must_use]
    pub fn cop(title: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            title: title.into(),
            quantity,
            unit_price: unit_price.to_f64(),
            currency_id: Money::CURRENCY_CODE.to_string(),
        }
    }
}

/// Buyer details forwarded to the gateway for fraud scoring and receipts.
#[derive(Debug, Clone, Serialize)]
pub struct PreferencePayer {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: PayerPhone,
    pub identification: PayerIdentification,
    pub address: PayerAddress,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayerPhone {
    pub number: String,
}

/// Identity document as `{"type": "CC", "number": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct PayerIdentification {
    #[serde(rename = "type")]
    pub document_type: String,
    pub number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayerAddress {
    pub street_name: String,
    pub city_name: String,
    pub state_name: String,
}

/// Return URLs for the hosted checkout redirect.
#[derive(Debug, Clone, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// Payment method restrictions for the preference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentMethods {
    pub excluded_payment_methods: Vec<ExcludedPaymentMethod>,
    pub excluded_payment_types: Vec<ExcludedPaymentMethod>,
    pub installments: u32,
}

impl PaymentMethods {
    /// No exclusions, capped at `installments` card installments.
    #[must_use]
    pub const fn with_installments(installments: u32) -> Self {
        Self {
            excluded_payment_methods: Vec::new(),
            excluded_payment_types: Vec::new(),
            installments,
        }
    }
}

/// A payment method or type excluded from the preference.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedPaymentMethod {
    pub id: String,
}

/// Response from `POST /checkout/preferences`.
#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceResponse {
    pub id: String,
    /// Hosted checkout URL for production credentials.
    pub init_point: String,
    /// Hosted checkout URL for test credentials.
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

/// Response from `GET /v1/payments/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInfo {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

impl PaymentInfo {
    /// The payment state as a typed status.
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_wire(&self.status)
    }

    /// Whether the payment cleared and the order may be fulfilled.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.payment_status().is_approved()
    }
}

/// A webhook notification body.
///
/// The gateway has sent two shapes over time: the current one carries
/// `type` and `data.id`, the legacy one `topic` and a top-level `id`.
/// Both are accepted; ids may arrive as JSON strings or numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    #[serde(default, rename = "type")]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl WebhookNotification {
    /// The notification topic, whichever field carried it.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .or(self.notification_type.as_deref())
    }

    /// The payment id the notification refers to, normalized to a string.
    #[must_use]
    pub fn payment_id(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|data| data.id.as_ref())
            .and_then(id_value_to_string)
            .or_else(|| self.id.as_ref().and_then(id_value_to_string))
    }
}

fn id_value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_serializes_gateway_fields() {
        let request = PreferenceRequest {
            items: vec![
                PreferenceItem::cop("Blusa Mariposa - Rojo/M", 2, Money::from_pesos(45_000)),
                PreferenceItem::cop("Envío - Coordinadora", 1, Money::from_pesos(12_000)),
                PreferenceItem::cop(
                    "Descuento cupón - DESCUENTO10",
                    1,
                    -Money::from_pesos(9_000),
                ),
            ],
            payer: PreferencePayer {
                name: "Ana".to_string(),
                surname: "García".to_string(),
                email: "ana@example.com".to_string(),
                phone: PayerPhone {
                    number: "3001234567".to_string(),
                },
                identification: PayerIdentification {
                    document_type: "CC".to_string(),
                    number: "1012345678".to_string(),
                },
                address: PayerAddress {
                    street_name: "Calle 10 # A12, Centro".to_string(),
                    city_name: "Medellín".to_string(),
                    state_name: "Antioquia".to_string(),
                },
            },
            back_urls: BackUrls {
                success: "https://liherfashion.co/pago/exitoso".to_string(),
                failure: "https://liherfashion.co/pago/fallido".to_string(),
                pending: "https://liherfashion.co/pago/pendiente".to_string(),
            },
            auto_return: Some("approved".to_string()),
            notification_url: None,
            payment_methods: PaymentMethods::with_installments(12),
            statement_descriptor: "LIHER FASHION".to_string(),
            external_reference: "PEDIDO-7-1735000000".to_string(),
            expires: false,
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(json["items"][0]["unit_price"], 45_000.0);
        assert_eq!(json["items"][0]["currency_id"], "COP");
        assert_eq!(json["items"][2]["unit_price"], -9_000.0);
        assert_eq!(json["payer"]["identification"]["type"], "CC");
        assert_eq!(json["payment_methods"]["installments"], 12);
        assert_eq!(json["auto_return"], "approved");
        assert_eq!(json["expires"], false);
        // Omitted, not null: the gateway rejects null notification URLs
        assert!(json.get("notification_url").is_none());
    }

    #[test]
    fn test_payment_info_status() {
        let payment: PaymentInfo = serde_json::from_value(serde_json::json!({
            "id": 987_654_321,
            "status": "approved",
            "status_detail": "accredited",
            "transaction_amount": 147_000.0,
            "payment_method_id": "visa",
            "external_reference": "PEDIDO-7-1735000000"
        }))
        .unwrap();

        assert!(payment.is_approved());
        assert_eq!(payment.payment_status(), PaymentStatus::Approved);
    }

    #[test]
    fn test_webhook_current_shape() {
        let body = serde_json::json!({
            "action": "payment.created",
            "api_version": "v1",
            "data": {"id": "123456789"},
            "id": 1_001,
            "live_mode": true,
            "type": "payment"
        });
        let notification: WebhookNotification = serde_json::from_value(body).unwrap();

        assert_eq!(notification.topic(), Some("payment"));
        assert_eq!(notification.payment_id().as_deref(), Some("123456789"));
    }

    #[test]
    fn test_webhook_legacy_shape() {
        let body = serde_json::json!({"topic": "payment", "id": 123_456_789});
        let notification: WebhookNotification = serde_json::from_value(body).unwrap();

        assert_eq!(notification.topic(), Some("payment"));
        assert_eq!(notification.payment_id().as_deref(), Some("123456789"));
    }

    #[test]
    fn test_webhook_non_payment_topic() {
        let body = serde_json::json!({"topic": "merchant_order", "id": 55});
        let notification: WebhookNotification = serde_json::from_value(body).unwrap();

        assert_eq!(notification.topic(), Some("merchant_order"));
    }
}
