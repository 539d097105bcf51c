//! Catalog section types.

use liher_core::{CategoryId, Money, ProductId, ProductStatus};

/// Product-level summary for the catalog page.
#[derive(Debug, Clone)]
pub struct ProductOverview {
    pub id: ProductId,
    pub name: String,
    pub reference: String,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub price: Money,
    pub status: ProductStatus,
    pub description: Option<String>,
    pub image: Option<String>,
    pub variant_count: i64,
    pub total_stock: i64,
}

impl ProductOverview {
    /// Whether any variant still has units to sell.
    #[must_use]
    pub const fn has_stock(&self) -> bool {
        self.total_stock > 0
    }
}

/// A lookup row (category, color or size) with its usage count.
#[derive(Debug, Clone)]
pub struct LookupEntry {
    pub id: i32,
    pub name: String,
    /// Products (for categories) or variants (for colors and sizes)
    /// referencing this entry. Colors and sizes with references cannot
    /// be deleted.
    pub in_use: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_stock_requires_positive_total() {
        let mut product = ProductOverview {
            id: ProductId::new(1),
            name: "Vestido midi".to_string(),
            reference: "VE-010".to_string(),
            category_id: None,
            category_name: None,
            price: Money::from_pesos(120_000),
            status: ProductStatus::Active,
            description: None,
            image: None,
            variant_count: 3,
            total_stock: 14,
        };
        assert!(product.has_stock());

        product.total_stock = 0;
        assert!(!product.has_stock());
    }
}
