//! Inventory section types.

use chrono::{DateTime, Utc};

use liher_core::{Money, ProductId, StockEntryId, VariantId};

/// Stock at or below this count shows the low-stock badge.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// One row of the variant-level inventory table.
#[derive(Debug, Clone)]
pub struct VariantStock {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub reference: String,
    pub category_name: Option<String>,
    pub size_name: String,
    pub color_name: String,
    pub price: Money,
    pub stock: i32,
    pub active: bool,
}

impl VariantStock {
    /// Badge class for the stock column.
    #[must_use]
    pub const fn stock_state(&self) -> &'static str {
        if self.stock == 0 {
            "agotado"
        } else if self.stock < LOW_STOCK_THRESHOLD {
            "bajo"
        } else {
            "ok"
        }
    }

    /// `Talla / Color` label used in selects and the movements table.
    #[must_use]
    pub fn variant_label(&self) -> String {
        format!("{} / {}", self.size_name, self.color_name)
    }
}

/// Header cards of the inventory page.
#[derive(Debug, Clone, Copy)]
pub struct InventoryStats {
    /// Distinct products with at least one variant.
    pub total_products: i64,
    /// Units across all variants.
    pub total_units: i64,
    /// Σ price × stock over all variants.
    pub inventory_value: Money,
    /// Variants under [`LOW_STOCK_THRESHOLD`] but not empty.
    pub low_stock: i64,
    /// Variants with zero stock.
    pub out_of_stock: i64,
}

/// One received stock entry, newest first in the movements view.
#[derive(Debug, Clone)]
pub struct StockEntry {
    pub id: StockEntryId,
    pub variant_id: VariantId,
    pub size_name: String,
    pub color_name: String,
    pub quantity: i32,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(stock: i32) -> VariantStock {
        VariantStock {
            variant_id: VariantId::new(1),
            product_id: ProductId::new(1),
            product_name: "Blusa manga larga".to_string(),
            reference: "BL-001".to_string(),
            category_name: Some("Blusas".to_string()),
            size_name: "M".to_string(),
            color_name: "Negro".to_string(),
            price: Money::from_pesos(45_000),
            stock,
            active: true,
        }
    }

    #[test]
    fn stock_state_thresholds() {
        assert_eq!(variant(0).stock_state(), "agotado");
        assert_eq!(variant(9).stock_state(), "bajo");
        assert_eq!(variant(10).stock_state(), "ok");
        assert_eq!(variant(120).stock_state(), "ok");
    }

    #[test]
    fn variant_label_joins_size_and_color() {
        assert_eq!(variant(5).variant_label(), "M / Negro");
    }
}
