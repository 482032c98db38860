//! Booking price rules shared by the cart quote endpoint and checkout.
//!
//! Amounts are [`Decimal`] rupees. A convenience fee is charged on the
//! cleaning portion of a cart only; coupons take a flat amount off the
//! subtotal.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Category whose lines attract the convenience fee
pub const CLEANING_CATEGORY: &str = "Cleaning Services";

const BASE_FEE: Decimal = dec!(39);
const FEE_STEP: Decimal = dec!(10);
const FEE_BRACKET: Decimal = dec!(500);

/// Largest amount the `DECIMAL(10,2)` money columns hold
pub const MAX_AMOUNT: Decimal = dec!(99999999.99);

/// Most units of a single service one line may book
pub const MAX_QUANTITY: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("price {0} is outside 0 to {max}", max = MAX_AMOUNT)]
    PriceOutOfRange(Decimal),
    #[error("quantity {0} is outside 1 to {max}", max = MAX_QUANTITY)]
    QuantityOutOfRange(u32),
    #[error("cart total exceeds {max}", max = MAX_AMOUNT)]
    TotalTooLarge,
}

impl From<PricingError> for ServiceError {
    fn from(err: PricingError) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

/// Checks a unit price against the storable range
pub fn check_price(price: Decimal) -> Result<Decimal, PricingError> {
    if price < Decimal::ZERO || price > MAX_AMOUNT {
        return Err(PricingError::PriceOutOfRange(price));
    }
    Ok(price)
}

/// Checks a line quantity against `1..=MAX_QUANTITY`
pub fn check_quantity(quantity: u32) -> Result<u32, PricingError> {
    if quantity == 0 || quantity > MAX_QUANTITY {
        return Err(PricingError::QuantityOutOfRange(quantity));
    }
    Ok(quantity)
}

fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, PricingError> {
    a.checked_add(b)
        .filter(|sum| *sum <= MAX_AMOUNT)
        .ok_or(PricingError::TotalTooLarge)
}

/// A line the pricing rules can read
pub trait PricedLine {
    fn unit_price(&self) -> Decimal;
    fn quantity(&self) -> u32;
    fn category(&self) -> Option<&str>;

    fn line_total(&self) -> Result<Decimal, PricingError> {
        let price = check_price(self.unit_price())?;
        let quantity = check_quantity(self.quantity())?;
        price
            .checked_mul(Decimal::from(quantity))
            .filter(|total| *total <= MAX_AMOUNT)
            .ok_or(PricingError::TotalTooLarge)
    }

    fn is_cleaning(&self) -> bool {
        self.category()
            .map(|c| c.trim().eq_ignore_ascii_case(CLEANING_CATEGORY))
            .unwrap_or(false)
    }
}

/// Fee over the cleaning subtotal: nothing without cleaning work, 39 below
/// 500, then 10 more for every full 500.
pub fn convenience_fee(cleaning_subtotal: Decimal) -> Decimal {
    if cleaning_subtotal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if cleaning_subtotal < FEE_BRACKET {
        return BASE_FEE;
    }
    BASE_FEE + FEE_STEP * (cleaning_subtotal / FEE_BRACKET).floor()
}

/// Flat coupon amount, never more than the subtotal and never negative
pub fn coupon_discount(coupon_amount: Decimal, subtotal: Decimal) -> Decimal {
    coupon_amount
        .max(Decimal::ZERO)
        .min(subtotal.max(Decimal::ZERO))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Quote {
    pub subtotal: Decimal,
    pub cleaning_subtotal: Decimal,
    pub convenience_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl Quote {
    pub fn zero() -> Self {
        Self {
            subtotal: Decimal::ZERO,
            cleaning_subtotal: Decimal::ZERO,
            convenience_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

/// Prices `lines`, applying `coupon_amount` when present. Fails when a line
/// is out of range or any amount would not fit a money column.
pub fn quote<'a, L, I>(lines: I, coupon_amount: Option<Decimal>) -> Result<Quote, PricingError>
where
    L: PricedLine + 'a,
    I: IntoIterator<Item = &'a L>,
{
    let mut subtotal = Decimal::ZERO;
    let mut cleaning_subtotal = Decimal::ZERO;
    for line in lines {
        let amount = line.line_total()?;
        subtotal = checked_sum(subtotal, amount)?;
        if line.is_cleaning() {
            cleaning_subtotal = checked_sum(cleaning_subtotal, amount)?;
        }
    }

    let convenience_fee = convenience_fee(cleaning_subtotal);
    let discount = coupon_amount
        .map(|amount| coupon_discount(amount, subtotal))
        .unwrap_or(Decimal::ZERO);
    let total = (checked_sum(subtotal, convenience_fee)? - discount).max(Decimal::ZERO);

    Ok(Quote {
        subtotal: subtotal.round_dp(2),
        cleaning_subtotal: cleaning_subtotal.round_dp(2),
        convenience_fee: convenience_fee.round_dp(2),
        discount: discount.round_dp(2),
        total: total.round_dp(2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    struct Line {
        price: Decimal,
        qty: u32,
        category: Option<&'static str>,
    }

    impl PricedLine for Line {
        fn unit_price(&self) -> Decimal {
            self.price
        }
        fn quantity(&self) -> u32 {
            self.qty
        }
        fn category(&self) -> Option<&str> {
            self.category
        }
    }

    fn line(price: Decimal, qty: u32, category: Option<&'static str>) -> Line {
        Line {
            price,
            qty,
            category,
        }
    }

    #[test_case(dec!(0) => dec!(0); "no cleaning work")]
    #[test_case(dec!(1) => dec!(39); "smallest cleaning order")]
    #[test_case(dec!(499) => dec!(39); "just below first bracket")]
    #[test_case(dec!(500) => dec!(49); "first bracket")]
    #[test_case(dec!(999) => dec!(49); "just below second bracket")]
    #[test_case(dec!(1000) => dec!(59); "second bracket")]
    #[test_case(dec!(2750.50) => dec!(89); "fractional subtotal")]
    fn fee_brackets(cleaning_subtotal: Decimal) -> Decimal {
        convenience_fee(cleaning_subtotal)
    }

    #[test]
    fn fee_only_counts_cleaning_lines() {
        let lines = vec![
            line(dec!(300), 2, Some("cleaning services")),
            line(dec!(2000), 1, Some("Painting")),
            line(dec!(150), 1, None),
        ];
        let q = quote(&lines, None).unwrap();
        assert_eq!(q.subtotal, dec!(2750));
        assert_eq!(q.cleaning_subtotal, dec!(600));
        assert_eq!(q.convenience_fee, dec!(49));
        assert_eq!(q.total, dec!(2799));
    }

    #[test]
    fn coupon_is_capped_at_subtotal() {
        let lines = vec![line(dec!(100), 1, Some("Painting"))];
        let q = quote(&lines, Some(dec!(250))).unwrap();
        assert_eq!(q.discount, dec!(100));
        assert_eq!(q.total, dec!(0));
    }

    #[test]
    fn empty_cart_quotes_zero() {
        let lines: Vec<Line> = Vec::new();
        assert_eq!(quote(&lines, Some(dec!(50))), Ok(Quote::zero()));
    }

    #[test]
    fn oversized_price_is_rejected_not_overflowed() {
        let huge: Decimal = "70000000000000000000000000000".parse().unwrap();
        let lines = vec![line(huge, 2, Some(CLEANING_CATEGORY))];
        assert_eq!(
            quote(&lines, None),
            Err(PricingError::PriceOutOfRange(huge))
        );
    }

    #[test]
    fn quantity_must_be_within_cap() {
        let lines = vec![line(dec!(10), MAX_QUANTITY + 1, None)];
        assert_eq!(
            quote(&lines, None),
            Err(PricingError::QuantityOutOfRange(MAX_QUANTITY + 1))
        );
        let lines = vec![line(dec!(10), MAX_QUANTITY, None)];
        assert_eq!(quote(&lines, None).unwrap().subtotal, dec!(10000));
    }

    #[test]
    fn totals_must_fit_money_columns() {
        let lines = vec![line(MAX_AMOUNT, 2, None)];
        assert_eq!(quote(&lines, None), Err(PricingError::TotalTooLarge));

        let lines = vec![line(MAX_AMOUNT, 1, None), line(dec!(0.01), 1, None)];
        assert_eq!(quote(&lines, None), Err(PricingError::TotalTooLarge));

        // the fee alone can push a full cart over the limit
        let lines = vec![line(MAX_AMOUNT, 1, Some(CLEANING_CATEGORY))];
        assert_eq!(quote(&lines, None), Err(PricingError::TotalTooLarge));

        let lines = vec![line(MAX_AMOUNT, 1, None)];
        assert_eq!(quote(&lines, None).unwrap().total, MAX_AMOUNT);
    }

    #[test]
    fn pricing_errors_map_to_validation() {
        let err: ServiceError = PricingError::TotalTooLarge.into();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    proptest! {
        #[test]
        fn fee_is_monotonic(a in 0u32..100_000, b in 0u32..100_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(convenience_fee(Decimal::from(lo)) <= convenience_fee(Decimal::from(hi)));
        }

        #[test]
        fn total_is_never_negative(price in 0u32..10_000, qty in 1u32..20, coupon in 0u32..500_000) {
            let lines = vec![line(Decimal::from(price), qty, Some(CLEANING_CATEGORY))];
            let q = quote(&lines, Some(Decimal::from(coupon))).unwrap();
            prop_assert!(q.total >= Decimal::ZERO);
            prop_assert!(q.discount <= q.subtotal);
            prop_assert_eq!(q.total, (q.subtotal + q.convenience_fee - q.discount).max(Decimal::ZERO));
        }
    }
}
