//! Discount coupon catalog.
//!
//! Codes are a fixed marketing set, matched case-insensitively. The
//! discount applies to the cart subtotal only, never to shipping.

use liher_core::Money;
use rust_decimal::Decimal;

/// A discount coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coupon {
    /// Uppercase redemption code.
    pub code: &'static str,
    /// Discount as a whole percentage of the subtotal.
    pub percent: u32,
    /// Display name confirmed back to the buyer.
    pub name: &'static str,
}

impl Coupon {
    /// The discount rate as a decimal fraction.
    #[must_use]
    pub fn rate(&self) -> Decimal {
        Decimal::new(self.percent.into(), 2)
    }

    /// The discount this coupon takes off a subtotal.
    #[must_use]
    pub fn discount_for(&self, subtotal: Money) -> Money {
        subtotal.percentage(self.rate())
    }
}

/// Every redeemable coupon.
pub const COUPONS: [Coupon; 5] = [
    Coupon {
        code: "DESCUENTO10",
        percent: 10,
        name: "10% de descuento",
    },
    Coupon {
        code: "DESCUENTO20",
        percent: 20,
        name: "20% de descuento",
    },
    Coupon {
        code: "PRIMERACOMPRA",
        percent: 15,
        name: "15% primera compra",
    },
    Coupon {
        code: "BIENVENIDA",
        percent: 5,
        name: "5% bienvenida",
    },
    Coupon {
        code: "NAVIDAD2024",
        percent: 25,
        name: "25% Navidad",
    },
];

/// Look up a coupon by code, ignoring case and surrounding whitespace.
#[must_use]
pub fn find(code: &str) -> Option<&'static Coupon> {
    let normalized = code.trim().to_uppercase();
    COUPONS.iter().find(|coupon| coupon.code == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_normalizes_case_and_whitespace() {
        assert_eq!(find(" descuento10 "), Some(&COUPONS[0]));
        assert_eq!(find("NAVIDAD2024"), Some(&COUPONS[4]));
        assert!(find("CUPONFALSO").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn test_discount_applies_to_subtotal() {
        let coupon = find("DESCUENTO10").expect("known code");
        assert_eq!(
            coupon.discount_for(Money::from_pesos(150_000)),
            Money::from_pesos(15_000)
        );
    }

    #[test]
    fn test_rates() {
        assert_eq!(
            find("PRIMERACOMPRA").expect("known code").rate(),
            Decimal::new(15, 2)
        );
        assert_eq!(
            find("BIENVENIDA").expect("known code").rate(),
            Decimal::new(5, 2)
        );
    }
}
