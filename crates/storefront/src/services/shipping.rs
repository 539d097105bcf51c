//! Shipping cost schedule.
//!
//! Flat per-carrier rates; the store ships nationwide at the same price
//! regardless of destination.

use liher_core::{Money, ShippingCarrier};

/// Quoted cost for a carrier, in whole pesos.
#[must_use]
pub fn carrier_cost(carrier: ShippingCarrier) -> Money {
    let pesos = match carrier {
        ShippingCarrier::Coordinadora => 12_000,
        ShippingCarrier::Interrapidisimo | ShippingCarrier::Envia => 15_000,
    };
    Money::from_pesos(pesos)
}

/// Cost assumed before the buyer picks a carrier.
#[must_use]
pub fn default_cost() -> Money {
    carrier_cost(ShippingCarrier::Coordinadora)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_costs() {
        assert_eq!(
            carrier_cost(ShippingCarrier::Coordinadora),
            Money::from_pesos(12_000)
        );
        assert_eq!(
            carrier_cost(ShippingCarrier::Interrapidisimo),
            Money::from_pesos(15_000)
        );
        assert_eq!(carrier_cost(ShippingCarrier::Envia), Money::from_pesos(15_000));
    }

    #[test]
    fn test_default_cost_is_cheapest_carrier() {
        assert_eq!(default_cost(), Money::from_pesos(12_000));
    }
}
