//! Checkout domain types: identification, shipping addresses and orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use liher_core::{
    DocumentType, Email, IdentificationId, Money, OrderId, OrderItemId, OrderStatus,
    PaymentStatus, ShippingAddressId, ShippingCarrier, UserId, VariantId,
};

/// Buyer identification captured in the first checkout step.
///
/// Keyed by user for logged-in buyers and by email for guests.
#[derive(Debug, Clone)]
pub struct Identification {
    pub id: IdentificationId,
    pub user_id: Option<UserId>,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub phone: String,
}

impl Identification {
    /// Buyer display name for orders and payment metadata.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A shipping address captured in the second checkout step.
///
/// At most one address is active per user; saving a new one deactivates
/// the rest in the same transaction.
#[derive(Debug, Clone)]
pub struct ShippingAddress {
    pub id: ShippingAddressId,
    pub user_id: Option<UserId>,
    pub identification_id: Option<IdentificationId>,
    pub department: String,
    pub municipality: String,
    /// Street kind, e.g. "Calle", "Carrera", "Avenida".
    pub address_type: String,
    pub street: String,
    pub letter: String,
    pub number: String,
    pub neighborhood: String,
    pub floor: Option<String>,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub carrier: ShippingCarrier,
    pub cost: Money,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl ShippingAddress {
    /// Compose the display address from its parts.
    ///
    /// `Calle 45 # B12, El Poblado, Piso 3` (the floor segment is omitted
    /// when not set).
    #[must_use]
    pub fn full_address(&self) -> String {
        let mut address = format!(
            "{} {} # {}{}, {}",
            self.address_type, self.street, self.letter, self.number, self.neighborhood
        );
        if let Some(floor) = self.floor.as_deref().filter(|f| !f.trim().is_empty()) {
            address.push_str(", Piso ");
            address.push_str(floor);
        }
        address
    }
}

/// An order written when Mercado Pago approves a payment.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    /// Buyer display name at purchase time.
    pub customer: String,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub payment_method: String,
    pub total: Money,
    pub payment_status: PaymentStatus,
    pub external_reference: Option<String>,
    pub payment_id: Option<String>,
}

/// A line of an order, with the price captured at purchase time.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub variant_id: VariantId,
    pub quantity: i32,
    pub unit_price: Money,
}

/// An order line joined with the product fields the order pages show.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub item_id: OrderItemId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub reference: String,
    pub size_name: String,
    pub color_name: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub unit_price: Money,
}

impl OrderLine {
    /// Line total: quantity times the price captured at purchase time.
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price * u32::try_from(self.quantity).unwrap_or(0)
    }
}

/// Totals carried through the checkout in the session.
///
/// Recomputed whenever the cart, the shipping choice or the coupon
/// changes, and read back by the payment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
    /// Applied coupon code, if any.
    pub coupon: Option<String>,
}

impl CheckoutTotals {
    /// Build totals from the parts: `total = subtotal + shipping - discount`.
    #[must_use]
    pub fn compute(
        subtotal: Money,
        shipping: Money,
        discount: Money,
        coupon: Option<String>,
    ) -> Self {
        let total = subtotal + shipping - discount;
        Self {
            subtotal,
            shipping,
            discount,
            total,
            coupon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn pesos(n: i64) -> Money {
        Money::new(Decimal::new(n, 0))
    }

    fn address(floor: Option<&str>) -> ShippingAddress {
        ShippingAddress {
            id: ShippingAddressId::new(1),
            user_id: Some(UserId::new(1)),
            identification_id: None,
            department: "Antioquia".to_string(),
            municipality: "Medellín".to_string(),
            address_type: "Calle".to_string(),
            street: "45".to_string(),
            letter: "B".to_string(),
            number: "12".to_string(),
            neighborhood: "El Poblado".to_string(),
            floor: floor.map(String::from),
            receiver_name: "Ana Gómez".to_string(),
            receiver_phone: "3001234567".to_string(),
            carrier: ShippingCarrier::Coordinadora,
            cost: pesos(12_000),
            active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn full_address_includes_floor_when_present() {
        assert_eq!(
            address(Some("3")).full_address(),
            "Calle 45 # B12, El Poblado, Piso 3"
        );
    }

    #[test]
    fn full_address_omits_blank_floor() {
        assert_eq!(address(None).full_address(), "Calle 45 # B12, El Poblado");
        assert_eq!(address(Some("  ")).full_address(), "Calle 45 # B12, El Poblado");
    }

    #[test]
    fn totals_combine_subtotal_shipping_and_discount() {
        let totals = CheckoutTotals::compute(
            pesos(150_000),
            pesos(12_000),
            pesos(15_000),
            Some("DESCUENTO10".to_string()),
        );
        assert_eq!(totals.total, pesos(147_000));
    }

    #[test]
    fn full_name_trims_blank_parts() {
        let ident = Identification {
            id: IdentificationId::new(1),
            user_id: None,
            email: Email::parse("ana@example.com").unwrap(),
            first_name: "Ana".to_string(),
            last_name: String::new(),
            document_type: DocumentType::Cc,
            document_number: "1020304050".to_string(),
            phone: "3001234567".to_string(),
        };
        assert_eq!(ident.full_name(), "Ana");
    }
}
