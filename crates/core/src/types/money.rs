//! Colombian peso amounts with decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in Colombian pesos.
///
/// The store operates in a single currency, so the type wraps the decimal
/// amount alone. Storage keeps two decimal places; display rounds to whole
/// pesos the way the store's receipts and JSON payloads do (`$12,000`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// ISO 4217 code sent to the payment gateway.
    pub const CURRENCY_CODE: &'static str = "COP";

    /// Zero pesos.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from whole pesos.
    #[must_use]
    pub fn from_pesos(pesos: i64) -> Self {
        Self(Decimal::from(pesos))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// The given fraction of this amount (e.g. `0.15` for a 15% discount).
    #[must_use]
    pub fn percentage(&self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// The amount as an `f64` for wire formats that require JSON numbers.
    ///
    /// Whole-peso amounts sit far inside the range `f64` represents
    /// exactly, so the conversion is lossless in practice.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or_default()
    }

    /// Format as `$12,000`: whole pesos, comma-grouped, sign between the
    /// currency symbol and the digits.
    #[must_use]
    pub fn formatted(&self) -> String {
        let rounded = self.0.round_dp(0);
        let grouped = group_thousands(&rounded.abs().to_string());
        if rounded.is_sign_negative() && !rounded.is_zero() {
            format!("$-{grouped}")
        } else {
            format!("${grouped}")
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

// SQLx support (with postgres feature): stored as NUMERIC
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_formatted_groups_thousands() {
        assert_eq!(Money::from_pesos(0).formatted(), "$0");
        assert_eq!(Money::from_pesos(950).formatted(), "$950");
        assert_eq!(Money::from_pesos(12_000).formatted(), "$12,000");
        assert_eq!(Money::from_pesos(1_234_567).formatted(), "$1,234,567");
    }

    #[test]
    fn test_formatted_rounds_to_whole_pesos() {
        let price = Money::new(Decimal::new(8_999_950, 2)); // 89,999.50
        assert_eq!(price.formatted(), "$90,000");
    }

    #[test]
    fn test_formatted_negative() {
        assert_eq!(Money::from_pesos(-4_500).formatted(), "$-4,500");
    }

    #[test]
    fn test_percentage() {
        let subtotal = Money::from_pesos(150_000);
        let discount = subtotal.percentage(Decimal::new(10, 2)); // 10%
        assert_eq!(discount, Money::from_pesos(15_000));
    }

    #[test]
    fn test_line_total_and_sum() {
        let unit = Money::from_pesos(45_000);
        let lines = vec![unit * 2, Money::from_pesos(30_000) * 1];
        let subtotal: Money = lines.into_iter().sum();
        assert_eq!(subtotal, Money::from_pesos(120_000));
    }

    #[test]
    fn test_checkout_total_arithmetic() {
        let subtotal = Money::from_pesos(100_000);
        let shipping = Money::from_pesos(12_000);
        let discount = subtotal.percentage(Decimal::new(20, 2));
        assert_eq!(subtotal + shipping - discount, Money::from_pesos(92_000));
    }

    #[test]
    fn test_serde_transparent() {
        let money = Money::from_pesos(12_000);
        // rust_decimal's serde-with-str default keeps Decimal as a string
        let json = serde_json::to_string(&money).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, money);
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(Money::from_pesos(12_000).to_f64(), 12_000.0);
        assert_eq!(Money::new(Decimal::new(4_550, 1)).to_f64(), 455.0);
    }
}
