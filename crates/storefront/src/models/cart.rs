//! Shopping cart domain types.

use chrono::{DateTime, Utc};

use liher_core::{CartId, CartItemId, Money, UserId, VariantId};

/// A shopping cart.
///
/// Belongs either to a user or to an anonymous session (the session keeps
/// the id). Marked completed exactly once, when a payment is approved.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
}

/// A single cart row.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub variant_id: VariantId,
    pub quantity: i32,
    /// Product price captured when the item was added.
    pub unit_price: Money,
}

impl CartItem {
    /// Line total (quantity times the captured unit price).
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price * u32::try_from(self.quantity).unwrap_or(0)
    }
}

/// A cart row joined with the product and variant fields pages display.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub reference: String,
    pub size_name: String,
    pub color_name: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub unit_price: Money,
    /// Current variant stock, used to bound quantity updates.
    pub stock: i32,
}

impl CartLine {
    /// Line total (quantity times the captured unit price).
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price * u32::try_from(self.quantity).unwrap_or(0)
    }
}

/// Sum the line totals of a cart.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(quantity: i32, price: i64) -> CartLine {
        CartLine {
            item_id: CartItemId::new(1),
            variant_id: VariantId::new(1),
            product_name: "Falda plisada".to_string(),
            reference: "FA-010".to_string(),
            size_name: "S".to_string(),
            color_name: "Rojo".to_string(),
            image: None,
            quantity,
            unit_price: Money::new(Decimal::new(price, 0)),
            stock: 10,
        }
    }

    #[test]
    fn line_total_multiplies_quantity() {
        assert_eq!(line(3, 20_000).total(), Money::new(Decimal::new(60_000, 0)));
    }

    #[test]
    fn subtotal_sums_lines() {
        let lines = vec![line(2, 45_000), line(1, 60_000)];
        assert_eq!(subtotal(&lines), Money::new(Decimal::new(150_000, 0)));
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() {
        assert!(subtotal(&[]).is_zero());
    }
}
