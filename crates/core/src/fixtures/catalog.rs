//! Catalog Fixtures

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    catalog::{
        Ingredient, IngredientCategory, IngredientId, MealkitId, PreparationType,
        PreparationTypeId, Product, ProductId, RecipeId,
    },
    fixtures::FixtureError,
    pricing::{money_from_decimal, parse_currency},
};

/// A catalog in YAML, keyed by fixture keys
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFixture {
    /// Map of ingredient key -> ingredient fixture
    pub ingredients: FxHashMap<String, IngredientFixture>,

    /// Map of preparation type key -> preparation type fixture
    pub preparation_types: FxHashMap<String, PreparationTypeFixture>,

    /// Map of product key -> product fixture
    pub products: FxHashMap<String, ProductFixture>,

    /// Map of recipe key -> recipe fixture
    pub recipes: FxHashMap<String, RecipeFixture>,

    /// Map of mealkit key -> mealkit fixture
    pub mealkits: FxHashMap<String, MealkitFixture>,
}

/// Ingredient Fixture
#[derive(Debug, Deserialize)]
pub struct IngredientFixture {
    /// Catalog identifier
    pub id: u64,

    /// Ingredient name
    pub name: String,

    /// Ingredient category
    pub category: String,

    /// Size of one unit (e.g., "200")
    pub unit_size: Decimal,

    /// Unit type (e.g., "g")
    pub unit: String,

    /// Price per unit (e.g., "5.00 USD")
    pub price: String,
}

impl TryFrom<IngredientFixture> for Ingredient {
    type Error = FixtureError;

    fn try_from(fixture: IngredientFixture) -> Result<Self, Self::Error> {
        Ok(Ingredient::new(
            IngredientId(fixture.id),
            fixture.name,
            IngredientCategory::new(fixture.category),
            fixture.unit_size,
            fixture.unit,
            parse_price(&fixture.price)?,
        )?)
    }
}

/// Preparation Type Fixture
#[derive(Debug, Deserialize)]
pub struct PreparationTypeFixture {
    /// Catalog identifier
    pub id: u64,

    /// Preparation name
    pub name: String,

    /// Ingredient category the preparation applies to
    pub category: String,

    /// Surcharge per ingredient unit (e.g., "1.50 USD")
    pub surcharge: String,
}

impl TryFrom<PreparationTypeFixture> for PreparationType {
    type Error = FixtureError;

    fn try_from(fixture: PreparationTypeFixture) -> Result<Self, Self::Error> {
        Ok(PreparationType::new(
            PreparationTypeId(fixture.id),
            fixture.name,
            IngredientCategory::new(fixture.category),
            parse_price(&fixture.surcharge)?,
        )?)
    }
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Catalog identifier
    pub id: u64,

    /// Product name
    pub name: String,

    /// Dietary tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Product price (e.g., "4.25 USD")
    pub price: String,
}

impl TryFrom<ProductFixture> for Product {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        Ok(Product::new(
            ProductId(fixture.id),
            fixture.name,
            fixture.tags.into_iter().collect(),
            parse_price(&fixture.price)?,
        )?)
    }
}

/// Recipe Fixture
///
/// Ingredients and preparation types are referenced by fixture key, so recipes can only be
/// built once those are loaded.
#[derive(Debug, Deserialize)]
pub struct RecipeFixture {
    /// Catalog identifier
    pub id: u64,

    /// Recipe name
    pub name: String,

    /// Default ingredient selections
    pub ingredients: Vec<SelectionFixture>,
}

impl RecipeFixture {
    /// Catalog identifier
    pub fn recipe_id(&self) -> RecipeId {
        RecipeId(self.id)
    }
}

/// Ingredient selection within a recipe fixture
#[derive(Debug, Deserialize)]
pub struct SelectionFixture {
    /// Ingredient key
    pub ingredient: String,

    /// Preparation type key
    #[serde(default)]
    pub preparation: Option<String>,

    /// Number of ingredient units
    #[serde(default = "one")]
    pub quantity: u32,
}

/// Mealkit Fixture
#[derive(Debug, Deserialize)]
pub struct MealkitFixture {
    /// Catalog identifier
    pub id: u64,

    /// Mealkit name
    pub name: String,

    /// Recipe keys, in display order
    pub recipes: Vec<String>,

    /// Bundle price (e.g., "19.99 USD")
    pub price: String,
}

impl MealkitFixture {
    /// Catalog identifier
    pub fn mealkit_id(&self) -> MealkitId {
        MealkitId(self.id)
    }
}

fn one() -> u32 {
    1
}

/// Parse price string (e.g., "2.99 GBP") into money
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount is not
/// a decimal with at most minor-unit precision, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency =
        parse_currency(code).map_err(|_err| FixtureError::UnknownCurrency(code.to_string()))?;

    money_from_decimal(amount, currency).map_err(|_err| FixtureError::InvalidPrice(s.to_string()))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        assert_eq!(parse_price("2.99 GBP")?, Money::from_minor(2_99, GBP));
        assert_eq!(parse_price("5 usd")?, Money::from_minor(5_00, USD));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_malformed_strings() {
        assert!(matches!(
            parse_price("2.99"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("2.99 GBP extra"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("two GBP"),
            Err(FixtureError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_sub_minor_precision() {
        assert!(matches!(
            parse_price("2.995 GBP"),
            Err(FixtureError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert!(matches!(
            parse_price("1.00 XYZ"),
            Err(FixtureError::UnknownCurrency(code)) if code == "XYZ"
        ));
    }
}
