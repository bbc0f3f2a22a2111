//! Pricing

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::{
    catalog::{Ingredient, IngredientCategory, IngredientId, PreparationType, PreparationTypeId},
    lines::Quantity,
};

/// Errors that can occur while resolving or aggregating prices.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The preparation type belongs to a different ingredient category than the ingredient.
    #[error(
        "preparation type {preparation} ({preparation_category}) cannot be applied to ingredient {ingredient} ({ingredient_category})"
    )]
    InvalidPreparationType {
        /// Ingredient the preparation was requested for
        ingredient: IngredientId,
        /// Category of that ingredient
        ingredient_category: IngredientCategory,
        /// Rejected preparation type
        preparation: PreparationTypeId,
        /// Category the preparation type applies to
        preparation_category: IngredientCategory,
    },

    /// A price is expressed in a different currency than expected (found, expected).
    #[error("price has currency {0}, but {1} was expected")]
    CurrencyMismatch(&'static str, &'static str),

    /// Multiplying or summing minor units overflowed.
    #[error("price arithmetic overflowed")]
    Overflow,

    /// Unknown ISO currency code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A decimal amount is finer than the currency's minor unit or out of range.
    #[error("{0} is not a valid amount in {1}")]
    InvalidAmount(Decimal, &'static str),
}

/// Resolves the effective unit price of an ingredient with an optional preparation type.
///
/// Without a preparation type this is the ingredient's base price; otherwise the preparation
/// surcharge is added on top. A zero surcharge still counts as a selected preparation.
///
/// # Errors
///
/// - [`PricingError::InvalidPreparationType`]: the preparation type targets another category.
/// - [`PricingError::CurrencyMismatch`]: the surcharge uses a different currency than the ingredient.
pub fn resolve_price(
    ingredient: &Ingredient,
    preparation: Option<&PreparationType>,
) -> Result<Money<'static, Currency>, PricingError> {
    let Some(preparation) = preparation else {
        return Ok(*ingredient.price());
    };

    if preparation.category() != ingredient.category() {
        return Err(PricingError::InvalidPreparationType {
            ingredient: ingredient.id(),
            ingredient_category: ingredient.category().clone(),
            preparation: preparation.id(),
            preparation_category: preparation.category().clone(),
        });
    }

    let base = ingredient.price();

    ensure_currency(preparation.surcharge(), base.currency())?;

    let minor = base
        .to_minor_units()
        .checked_add(preparation.surcharge().to_minor_units())
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, base.currency()))
}

/// Multiplies a unit price by a line quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the minor unit total does not fit in an `i64`.
pub fn line_total(
    unit: Money<'static, Currency>,
    quantity: Quantity,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = unit
        .to_minor_units()
        .checked_mul(i64::from(quantity.get()))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, unit.currency()))
}

/// Splits a line total back into a unit price, rounding down to the minor unit.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the division cannot be represented.
pub fn unit_share(
    total: Money<'static, Currency>,
    quantity: Quantity,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = total
        .to_minor_units()
        .checked_div(i64::from(quantity.get()))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, total.currency()))
}

/// Sums prices, starting from zero in the given currency.
///
/// # Errors
///
/// - [`PricingError::CurrencyMismatch`]: a price is not in `currency`.
/// - [`PricingError::Overflow`]: the sum does not fit in an `i64`.
pub fn total_price<I>(
    prices: I,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError>
where
    I: IntoIterator<Item = Money<'static, Currency>>,
{
    let minor = prices.into_iter().try_fold(0_i64, |acc, price| {
        ensure_currency(&price, currency)?;

        acc.checked_add(price.to_minor_units())
            .ok_or(PricingError::Overflow)
    })?;

    Ok(Money::from_minor(minor, currency))
}

/// Applies the difference between two component sums to a server-supplied unit price.
///
/// Used for optimistic totals of bundle-priced lines: when nothing changed, `current` equals
/// `anchor` and the unit price is returned untouched. The result is floored at zero.
///
/// # Errors
///
/// - [`PricingError::CurrencyMismatch`]: the prices do not share a currency.
/// - [`PricingError::Overflow`]: the adjusted price does not fit in an `i64`.
pub fn adjusted_unit_price(
    unit: Money<'static, Currency>,
    current: Money<'static, Currency>,
    anchor: Money<'static, Currency>,
) -> Result<Money<'static, Currency>, PricingError> {
    let currency = unit.currency();

    ensure_currency(&current, currency)?;
    ensure_currency(&anchor, currency)?;

    let minor = current
        .to_minor_units()
        .checked_sub(anchor.to_minor_units())
        .and_then(|delta| unit.to_minor_units().checked_add(delta))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor.max(0), currency))
}

/// Looks up a supported ISO currency by its alphabetic code.
///
/// # Errors
///
/// Returns [`PricingError::UnknownCurrency`] for unsupported codes.
pub fn parse_currency(code: &str) -> Result<&'static Currency, PricingError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "GBP" => Ok(iso::GBP),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        "CAD" => Ok(iso::CAD),
        "AUD" => Ok(iso::AUD),
        _ => Err(PricingError::UnknownCurrency(code.to_string())),
    }
}

/// Converts a decimal amount in major units (e.g. `4.25`) into money.
///
/// # Errors
///
/// Returns [`PricingError::InvalidAmount`] if the amount has more precision than the
/// currency's minor unit or does not fit in an `i64` of minor units.
pub fn money_from_decimal(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let invalid = || PricingError::InvalidAmount(amount, currency.iso_alpha_code);

    let minor = 10_i64
        .checked_pow(currency.exponent)
        .and_then(|scale| amount.checked_mul(Decimal::from(scale)))
        .ok_or_else(invalid)?;

    if !minor.fract().is_zero() {
        return Err(invalid());
    }

    let minor = minor.to_i64().ok_or_else(invalid)?;

    Ok(Money::from_minor(minor, currency))
}

pub(crate) fn ensure_currency(
    price: &Money<'static, Currency>,
    currency: &'static Currency,
) -> Result<(), PricingError> {
    if price.currency() == currency {
        Ok(())
    } else {
        Err(PricingError::CurrencyMismatch(
            price.currency().iso_alpha_code,
            currency.iso_alpha_code,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    fn ingredient(category: &str, price: i64) -> Result<Ingredient, crate::catalog::CatalogError> {
        Ingredient::new(
            IngredientId(1),
            "Chicken breast",
            IngredientCategory::new(category),
            Decimal::new(200, 0),
            "g",
            Money::from_minor(price, USD),
        )
    }

    fn preparation(
        category: &str,
        surcharge: i64,
    ) -> Result<PreparationType, crate::catalog::CatalogError> {
        PreparationType::new(
            PreparationTypeId(7),
            "Grilled",
            IngredientCategory::new(category),
            Money::from_minor(surcharge, USD),
        )
    }

    #[test]
    fn money_from_decimal_scales_to_minor_units() -> TestResult {
        assert_eq!(
            money_from_decimal(Decimal::new(425, 2), USD)?,
            Money::from_minor(4_25, USD)
        );
        assert_eq!(
            money_from_decimal(Decimal::new(3, 0), GBP)?,
            Money::from_minor(3_00, GBP)
        );

        Ok(())
    }

    #[test]
    fn money_from_decimal_rejects_fractional_minor_units() {
        assert_eq!(
            money_from_decimal(Decimal::new(4255, 3), USD),
            Err(PricingError::InvalidAmount(Decimal::new(4255, 3), "USD"))
        );
    }

    #[test]
    fn resolve_price_without_preparation_is_base_price() -> TestResult {
        let ingredient = ingredient("poultry", 5_00)?;

        assert_eq!(resolve_price(&ingredient, None)?, Money::from_minor(5_00, USD));

        Ok(())
    }

    #[test]
    fn resolve_price_adds_surcharge() -> TestResult {
        let ingredient = ingredient("poultry", 5_00)?;
        let grilled = preparation("poultry", 1_50)?;

        assert_eq!(
            resolve_price(&ingredient, Some(&grilled))?,
            Money::from_minor(6_50, USD)
        );

        Ok(())
    }

    #[test]
    fn zero_surcharge_is_a_valid_selection() -> TestResult {
        let ingredient = ingredient("poultry", 5_00)?;
        let raw = preparation("poultry", 0)?;

        assert_eq!(
            resolve_price(&ingredient, Some(&raw))?,
            resolve_price(&ingredient, None)?
        );

        Ok(())
    }

    #[test]
    fn resolve_price_rejects_other_category() -> TestResult {
        let ingredient = ingredient("poultry", 5_00)?;
        let diced = preparation("vegetable", 50)?;

        let result = resolve_price(&ingredient, Some(&diced));

        assert!(
            matches!(
                result,
                Err(PricingError::InvalidPreparationType { ingredient, preparation, .. })
                    if ingredient == IngredientId(1) && preparation == PreparationTypeId(7)
            ),
            "expected InvalidPreparationType, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn line_total_multiplies_by_quantity() -> TestResult {
        let total = line_total(Money::from_minor(6_50, USD), Quantity::new(2)?)?;

        assert_eq!(total, Money::from_minor(13_00, USD));

        Ok(())
    }

    #[test]
    fn line_total_overflow_is_reported() -> TestResult {
        let result = line_total(Money::from_minor(i64::MAX, USD), Quantity::new(2)?);

        assert_eq!(result, Err(PricingError::Overflow));

        Ok(())
    }

    #[test]
    fn unit_share_divides_total_by_quantity() -> TestResult {
        assert_eq!(
            unit_share(Money::from_minor(39_98, USD), Quantity::new(2)?)?,
            Money::from_minor(19_99, USD)
        );
        assert_eq!(
            unit_share(Money::from_minor(10_00, USD), Quantity::new(3)?)?,
            Money::from_minor(3_33, USD)
        );

        Ok(())
    }

    #[test]
    fn total_price_of_nothing_is_zero() -> TestResult {
        assert_eq!(total_price([], GBP)?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn total_price_rejects_mixed_currencies() {
        let result = total_price(
            [Money::from_minor(100, GBP), Money::from_minor(100, USD)],
            GBP,
        );

        assert_eq!(result, Err(PricingError::CurrencyMismatch("USD", "GBP")));
    }

    #[test]
    fn adjusted_unit_price_applies_component_delta() -> TestResult {
        let unit = Money::from_minor(20_00, USD);

        let unchanged = adjusted_unit_price(
            unit,
            Money::from_minor(23_00, USD),
            Money::from_minor(23_00, USD),
        )?;
        let grown = adjusted_unit_price(
            unit,
            Money::from_minor(28_00, USD),
            Money::from_minor(23_00, USD),
        )?;
        let floored = adjusted_unit_price(
            unit,
            Money::from_minor(0, USD),
            Money::from_minor(30_00, USD),
        )?;

        assert_eq!(unchanged, unit);
        assert_eq!(grown, Money::from_minor(25_00, USD));
        assert_eq!(floored, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn parse_currency_is_case_insensitive() -> TestResult {
        assert_eq!(parse_currency("usd")?, USD);
        assert!(matches!(
            parse_currency("XYZ"),
            Err(PricingError::UnknownCurrency(code)) if code == "XYZ"
        ));

        Ok(())
    }
}
