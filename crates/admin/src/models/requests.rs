//! Product request (petición) section types.

use chrono::{DateTime, Utc};

use liher_core::{ProductRequestId, VariantId};

/// A customer request for an out-of-stock variant, joined with the
/// requester and the variant's current stock.
#[derive(Debug, Clone)]
pub struct ProductRequest {
    pub id: ProductRequestId,
    pub variant_id: VariantId,
    pub customer_name: String,
    pub customer_email: String,
    pub product_name: String,
    pub reference: String,
    pub size_name: String,
    pub color_name: String,
    pub quantity: i32,
    /// Stock the variant has now, to judge whether the request can
    /// already be fulfilled.
    pub current_stock: i32,
    pub requested_at: DateTime<Utc>,
    pub attended: bool,
}

impl ProductRequest {
    /// Whether current stock covers the requested quantity.
    #[must_use]
    pub const fn fulfillable(&self) -> bool {
        self.current_stock >= self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfillable_compares_stock_to_request() {
        let mut request = ProductRequest {
            id: ProductRequestId::new(1),
            variant_id: VariantId::new(2),
            customer_name: "Ana Gómez".to_string(),
            customer_email: "ana@example.com".to_string(),
            product_name: "Blusa manga larga".to_string(),
            reference: "BL-001".to_string(),
            size_name: "M".to_string(),
            color_name: "Negro".to_string(),
            quantity: 2,
            current_stock: 0,
            requested_at: Utc::now(),
            attended: false,
        };
        assert!(!request.fulfillable());

        request.current_stock = 2;
        assert!(request.fulfillable());
    }
}
