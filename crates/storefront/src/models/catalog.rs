//! Catalog domain types.

use chrono::{DateTime, Utc};

use liher_core::{
    CategoryId, ColorId, Money, ProductId, ProductRequestId, ProductStatus, SizeId, UserId,
    VariantId,
};

/// A product category lookup row.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A color lookup row.
#[derive(Debug, Clone)]
pub struct Color {
    pub id: ColorId,
    pub name: String,
}

/// A size lookup row.
#[derive(Debug, Clone)]
pub struct Size {
    pub id: SizeId,
    pub name: String,
}

/// A catalog product with its category name resolved.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Short unique merchant reference (up to 10 characters).
    pub reference: String,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub price: Money,
    pub description: Option<String>,
    /// Image path under the static root, stored verbatim.
    pub image: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product is visible on the public catalog.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, ProductStatus::Active)
    }
}

/// A size/color variant of a product, with lookup names resolved.
#[derive(Debug, Clone)]
pub struct VariantOption {
    pub id: VariantId,
    pub product_id: ProductId,
    pub size_id: SizeId,
    pub size_name: String,
    pub color_id: ColorId,
    pub color_name: String,
    /// Variant image, falling back to the product image when absent.
    pub image: Option<String>,
    pub stock: i32,
    pub active: bool,
}

impl VariantOption {
    /// Whether the variant can currently be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.active && self.stock > 0
    }
}

/// A variant joined with the product fields the cart needs.
#[derive(Debug, Clone)]
pub struct VariantWithProduct {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub reference: String,
    pub price: Money,
    pub size_name: String,
    pub color_name: String,
    pub image: Option<String>,
    pub stock: i32,
    pub active: bool,
}

/// A customer request for an out-of-stock variant.
#[derive(Debug, Clone)]
pub struct ProductRequest {
    pub id: ProductRequestId,
    pub user_id: UserId,
    pub variant_id: VariantId,
    pub quantity: i32,
    pub requested_at: DateTime<Utc>,
    pub attended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn variant_in_stock_requires_active_and_positive_stock() {
        let mut variant = VariantOption {
            id: VariantId::new(1),
            product_id: ProductId::new(1),
            size_id: SizeId::new(1),
            size_name: "M".to_string(),
            color_id: ColorId::new(1),
            color_name: "Negro".to_string(),
            image: None,
            stock: 3,
            active: true,
        };
        assert!(variant.in_stock());

        variant.stock = 0;
        assert!(!variant.in_stock());

        variant.stock = 3;
        variant.active = false;
        assert!(!variant.in_stock());
    }

    #[test]
    fn product_active_follows_status() {
        let product = Product {
            id: ProductId::new(1),
            name: "Blusa manga larga".to_string(),
            reference: "BL-001".to_string(),
            category_id: None,
            category_name: None,
            price: Money::new(Decimal::new(45_000, 0)),
            description: None,
            image: None,
            status: ProductStatus::Active,
            created_at: Utc::now(),
        };
        assert!(product.is_active());
    }
}
