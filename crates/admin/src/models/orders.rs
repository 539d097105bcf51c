//! Order section types.

use chrono::{DateTime, Utc};

use liher_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentStatus, UserId, VariantId};

/// One row of the order list.
#[derive(Debug, Clone)]
pub struct OrderSummary {
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
    pub item_count: i64,
}

/// An order line joined with the product fields the detail page shows.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub item_id: OrderItemId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub reference: String,
    pub size_name: String,
    pub color_name: String,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_captured_price() {
        let line = OrderLine {
            item_id: OrderItemId::new(1),
            variant_id: VariantId::new(3),
            product_name: "Falda plisada".to_string(),
            reference: "FA-004".to_string(),
            size_name: "S".to_string(),
            color_name: "Vino".to_string(),
            quantity: 3,
            unit_price: Money::from_pesos(60_000),
        };
        assert_eq!(line.total(), Money::from_pesos(180_000));
    }
}
