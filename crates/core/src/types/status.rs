//! Status and closed-vocabulary enums shared across the workspace.
//!
//! Database columns store the Spanish wire values (`Activo`, `Procesando`,
//! carrier codes), so every enum here exposes `as_str` / `FromStr` pairs and
//! row conversions parse with those.

use serde::{Deserialize, Serialize};

/// Whether a catalog product is offered for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductStatus {
    #[default]
    #[serde(rename = "Activo")]
    Active,
    #[serde(rename = "Inactivo")]
    Inactive,
}

impl ProductStatus {
    /// The stored/displayed value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Activo",
            Self::Inactive => "Inactivo",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Activo" => Ok(Self::Active),
            "Inactivo" => Ok(Self::Inactive),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}

/// Lifecycle of a confirmed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Procesando")]
    Processing,
    #[serde(rename = "Enviado")]
    Shipped,
    #[serde(rename = "Entregado")]
    Delivered,
    #[serde(rename = "Cancelado")]
    Cancelled,
}

impl OrderStatus {
    /// The stored/displayed value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "Procesando",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregado",
            Self::Cancelled => "Cancelado",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Procesando" => Ok(Self::Processing),
            "Enviado" => Ok(Self::Shipped),
            "Entregado" => Ok(Self::Delivered),
            "Cancelado" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment states reported by MercadoPago.
///
/// The gateway may introduce new states; unrecognized values deserialize as
/// [`PaymentStatus::Unknown`] instead of failing the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    #[default]
    Pending,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Whether the payment cleared and the order may be fulfilled.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// The gateway's wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::InMediation => "in_mediation",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::ChargedBack => "charged_back",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire value, mapping unrecognized states to `Unknown`.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "approved" => Self::Approved,
            "pending" => Self::Pending,
            "in_process" => Self::InProcess,
            "in_mediation" => Self::InMediation,
            "rejected" => Self::Rejected,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "charged_back" => Self::ChargedBack,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colombian identity document types accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "CC")]
    Cc,
    #[serde(rename = "CE")]
    Ce,
    #[serde(rename = "TI")]
    Ti,
    #[serde(rename = "PP")]
    Passport,
    #[serde(rename = "NIT")]
    Nit,
}

impl DocumentType {
    /// Every accepted type, in form-select order.
    pub const ALL: [Self; 5] = [Self::Cc, Self::Ce, Self::Ti, Self::Passport, Self::Nit];

    /// The short code stored and sent to the payment gateway.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Cc => "CC",
            Self::Ce => "CE",
            Self::Ti => "TI",
            Self::Passport => "PP",
            Self::Nit => "NIT",
        }
    }

    /// Human-readable label for forms.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cc => "Cédula de Ciudadanía",
            Self::Ce => "Cédula de Extranjería",
            Self::Ti => "Tarjeta de Identidad",
            Self::Passport => "Pasaporte",
            Self::Nit => "NIT",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CC" => Ok(Self::Cc),
            "CE" => Ok(Self::Ce),
            "TI" => Ok(Self::Ti),
            "PP" => Ok(Self::Passport),
            "NIT" => Ok(Self::Nit),
            _ => Err(format!("invalid document type: {s}")),
        }
    }
}

/// Shipping carriers the store quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingCarrier {
    Coordinadora,
    Interrapidisimo,
    Envia,
}

impl ShippingCarrier {
    /// Every carrier, in form-select order.
    pub const ALL: [Self; 3] = [Self::Coordinadora, Self::Interrapidisimo, Self::Envia];

    /// The stored form value.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Coordinadora => "coordinadora",
            Self::Interrapidisimo => "interrapidisimo",
            Self::Envia => "envia",
        }
    }

    /// Display name shown to customers and on gateway line items.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Coordinadora => "Coordinadora",
            Self::Interrapidisimo => "Interrapidísimo",
            Self::Envia => "Envía",
        }
    }
}

impl std::fmt::Display for ShippingCarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for ShippingCarrier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coordinadora" => Ok(Self::Coordinadora),
            "interrapidisimo" => Ok(Self::Interrapidisimo),
            "envia" => Ok(Self::Envia),
            _ => Err(format!("invalid shipping carrier: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_status_roundtrip() {
        assert_eq!(
            "Activo".parse::<ProductStatus>().unwrap(),
            ProductStatus::Active
        );
        assert_eq!(ProductStatus::Inactive.as_str(), "Inactivo");
        assert!("activo".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_order_status_spanish_values() {
        assert_eq!(OrderStatus::Processing.as_str(), "Procesando");
        assert_eq!(
            "Entregado".parse::<OrderStatus>().unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn test_payment_status_deserializes_gateway_values() {
        let status: PaymentStatus = serde_json::from_str("\"approved\"").unwrap();
        assert!(status.is_approved());

        let status: PaymentStatus = serde_json::from_str("\"in_process\"").unwrap();
        assert_eq!(status, PaymentStatus::InProcess);
    }

    #[test]
    fn test_payment_status_unknown_values_do_not_fail() {
        let status: PaymentStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(status, PaymentStatus::Unknown);
        assert!(!status.is_approved());
    }

    #[test]
    fn test_payment_status_from_wire() {
        assert_eq!(PaymentStatus::from_wire("approved"), PaymentStatus::Approved);
        assert_eq!(
            PaymentStatus::from_wire("charged_back"),
            PaymentStatus::ChargedBack
        );
        assert_eq!(PaymentStatus::from_wire("whatever"), PaymentStatus::Unknown);
    }

    #[test]
    fn test_document_type_codes() {
        assert_eq!(DocumentType::Cc.code(), "CC");
        assert_eq!(DocumentType::Cc.label(), "Cédula de Ciudadanía");
        assert_eq!("NIT".parse::<DocumentType>().unwrap(), DocumentType::Nit);
    }

    #[test]
    fn test_carrier_codes_and_labels() {
        assert_eq!(
            "interrapidisimo".parse::<ShippingCarrier>().unwrap(),
            ShippingCarrier::Interrapidisimo
        );
        assert_eq!(ShippingCarrier::Envia.label(), "Envía");
        assert!("dhl".parse::<ShippingCarrier>().is_err());
    }
}
