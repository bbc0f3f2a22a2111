//! Recipe Lines

use rusty_money::{Money, iso::Currency};

use crate::{
    catalog::RecipeId,
    lines::{IngredientLine, LineError, LineId, Quantity},
    pricing::{adjusted_unit_price, ensure_currency, line_total, total_price, unit_share},
};

/// How a recipe line's total is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecipePricing {
    /// Sum of the ingredient lines times the quantity. Used for standalone recipes.
    Itemised,

    /// Priced as part of a mealkit bundle.
    ///
    /// `unit_price` is the price of one recipe as supplied by the server (or the catalog) and
    /// `anchor` the ingredient sum at that moment. Local edits shift the unit price by the
    /// change in the ingredient sum.
    Bundled {
        /// Unit price at the time it was supplied
        unit_price: Money<'static, Currency>,
        /// Ingredient sum at the time the unit price was supplied
        anchor: Money<'static, Currency>,
    },
}

/// A recipe in the cart, standalone or inside a mealkit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeLine {
    id: LineId,
    recipe_id: RecipeId,
    name: String,
    quantity: Quantity,
    ingredients: Vec<IngredientLine>,
    pricing: RecipePricing,
    total_price: Money<'static, Currency>,
    currency: &'static Currency,
}

impl RecipeLine {
    /// Creates a standalone recipe line priced from its ingredients.
    ///
    /// # Errors
    ///
    /// - [`LineError::InvalidQuantity`]: `quantity` is zero.
    /// - [`LineError::EmptyName`]: `name` is empty.
    /// - [`LineError::Pricing`]: an ingredient is priced in another currency.
    pub fn standalone(
        id: LineId,
        recipe_id: RecipeId,
        name: impl Into<String>,
        ingredients: Vec<IngredientLine>,
        quantity: u32,
        currency: &'static Currency,
    ) -> Result<Self, LineError> {
        let mut line = Self::build(id, recipe_id, name.into(), ingredients, quantity, currency)?;

        line.recompute_total()?;

        Ok(line)
    }

    /// Creates a recipe line owned by a mealkit.
    ///
    /// Without a `unit_price` the current ingredient sum is used, so the line starts out
    /// priced like a standalone recipe.
    ///
    /// # Errors
    ///
    /// - [`LineError::InvalidQuantity`]: `quantity` is zero.
    /// - [`LineError::EmptyName`]: `name` is empty.
    /// - [`LineError::Pricing`]: a price is in another currency.
    pub fn in_mealkit(
        id: LineId,
        recipe_id: RecipeId,
        name: impl Into<String>,
        ingredients: Vec<IngredientLine>,
        quantity: u32,
        unit_price: Option<Money<'static, Currency>>,
        currency: &'static Currency,
    ) -> Result<Self, LineError> {
        let mut line = Self::build(id, recipe_id, name.into(), ingredients, quantity, currency)?;
        let anchor = line.components_total()?;
        let unit_price = unit_price.unwrap_or(anchor);

        ensure_currency(&unit_price, currency)?;

        line.pricing = RecipePricing::Bundled { unit_price, anchor };
        line.recompute_total()?;

        Ok(line)
    }

    /// Replaces the cached total with a server-supplied one.
    ///
    /// The unit price is rebased on `total` and the anchor on the current ingredient sum, so
    /// later edits shift the server total rather than the ingredient sum. Only bundle-priced
    /// lines accept an external total; standalone lines are always the sum of their
    /// ingredients.
    ///
    /// # Errors
    ///
    /// - [`LineError::MisplacedRecipe`]: the line is standalone.
    /// - [`LineError::Pricing`]: `total` is in another currency.
    pub fn with_server_total(mut self, total: Money<'static, Currency>) -> Result<Self, LineError> {
        if !self.is_from_mealkit() {
            return Err(LineError::MisplacedRecipe(self.id));
        }

        ensure_currency(&total, self.currency)?;

        self.pricing = RecipePricing::Bundled {
            unit_price: unit_share(total, self.quantity)?,
            anchor: self.components_total()?,
        };
        self.total_price = total;

        Ok(self)
    }

    fn build(
        id: LineId,
        recipe_id: RecipeId,
        name: String,
        ingredients: Vec<IngredientLine>,
        quantity: u32,
        currency: &'static Currency,
    ) -> Result<Self, LineError> {
        if name.trim().is_empty() {
            return Err(LineError::EmptyName("recipe"));
        }

        Ok(Self {
            id,
            recipe_id,
            name,
            quantity: Quantity::new(quantity)?,
            ingredients,
            pricing: RecipePricing::Itemised,
            total_price: Money::from_minor(0, currency),
            currency,
        })
    }

    /// Line identifier
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Catalog recipe this line was built from
    pub fn recipe_id(&self) -> RecipeId {
        self.recipe_id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of recipes
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Ingredient lines, in display order
    pub fn ingredients(&self) -> &[IngredientLine] {
        &self.ingredients
    }

    /// Looks up an ingredient line.
    pub fn ingredient(&self, id: LineId) -> Option<&IngredientLine> {
        self.ingredients.iter().find(|line| line.id() == id)
    }

    /// Pricing mode
    pub fn pricing(&self) -> RecipePricing {
        self.pricing
    }

    /// True when the line is owned by a mealkit line
    pub fn is_from_mealkit(&self) -> bool {
        matches!(self.pricing, RecipePricing::Bundled { .. })
    }

    /// Cached total price
    pub fn total_price(&self) -> Money<'static, Currency> {
        self.total_price
    }

    /// Sum of the ingredient line prices for one recipe.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] if an ingredient is priced in another currency.
    pub fn components_total(&self) -> Result<Money<'static, Currency>, LineError> {
        Ok(total_price(
            self.ingredients.iter().map(IngredientLine::price),
            self.currency,
        )?)
    }

    /// Recomputes the cached total from the (already current) ingredient lines.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] on currency mismatch or overflow.
    pub fn recompute_total(&mut self) -> Result<(), LineError> {
        let components = self.components_total()?;

        let unit = match self.pricing {
            RecipePricing::Itemised => components,
            RecipePricing::Bundled { unit_price, anchor } => {
                adjusted_unit_price(unit_price, components, anchor)?
            }
        };

        self.total_price = line_total(unit, self.quantity)?;

        Ok(())
    }

    pub(crate) fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
    }

    pub(crate) fn ingredient_mut(&mut self, id: LineId) -> Option<&mut IngredientLine> {
        self.ingredients.iter_mut().find(|line| line.id() == id)
    }

    pub(crate) fn push_ingredient(&mut self, line: IngredientLine) {
        self.ingredients.push(line);
    }

    pub(crate) fn remove_ingredient(&mut self, id: LineId) -> Option<IngredientLine> {
        let index = self.ingredients.iter().position(|line| line.id() == id)?;

        Some(self.ingredients.remove(index))
    }

    pub(crate) fn max_line_id(&self) -> LineId {
        self.ingredients
            .iter()
            .map(IngredientLine::id)
            .chain(std::iter::once(self.id))
            .max()
            .unwrap_or(self.id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{
        catalog::{Ingredient, IngredientCategory, IngredientId, PreparationType, PreparationTypeId},
        pricing::PricingError,
    };

    use super::*;

    fn lines() -> TestResult<Vec<IngredientLine>> {
        let chicken = Ingredient::new(
            IngredientId(1),
            "Chicken breast",
            IngredientCategory::new("poultry"),
            Decimal::new(200, 0),
            "g",
            Money::from_minor(5_00, USD),
        )?;
        let grilled = PreparationType::new(
            PreparationTypeId(2),
            "Grilled",
            IngredientCategory::new("poultry"),
            Money::from_minor(1_50, USD),
        )?;

        Ok(vec![
            IngredientLine::new(LineId(10), chicken.clone(), None, 2)?,
            IngredientLine::new(LineId(11), chicken, Some(grilled), 2)?,
        ])
    }

    #[test]
    fn standalone_total_is_sum_of_ingredients() -> TestResult {
        let line = RecipeLine::standalone(LineId(1), RecipeId(5), "Bowl", lines()?, 1, USD)?;

        assert_eq!(line.total_price(), Money::from_minor(23_00, USD));
        assert!(!line.is_from_mealkit());

        Ok(())
    }

    #[test]
    fn standalone_total_scales_with_quantity() -> TestResult {
        let line = RecipeLine::standalone(LineId(1), RecipeId(5), "Bowl", lines()?, 3, USD)?;

        assert_eq!(line.total_price(), Money::from_minor(69_00, USD));

        Ok(())
    }

    #[test]
    fn empty_recipe_costs_nothing() -> TestResult {
        let line = RecipeLine::standalone(LineId(1), RecipeId(5), "Bowl", Vec::new(), 1, GBP)?;

        assert_eq!(line.total_price(), Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn ingredients_in_other_currency_are_rejected() -> TestResult {
        let result = RecipeLine::standalone(LineId(1), RecipeId(5), "Bowl", lines()?, 1, GBP);

        assert_eq!(
            result,
            Err(LineError::Pricing(PricingError::CurrencyMismatch(
                "USD", "GBP"
            )))
        );

        Ok(())
    }

    #[test]
    fn bundled_line_keeps_server_unit_price_until_edited() -> TestResult {
        let mut line = RecipeLine::in_mealkit(
            LineId(1),
            RecipeId(5),
            "Bowl",
            lines()?,
            1,
            Some(Money::from_minor(20_00, USD)),
            USD,
        )?;

        assert_eq!(line.total_price(), Money::from_minor(20_00, USD));

        line.remove_ingredient(LineId(10));
        line.recompute_total()?;

        assert_eq!(line.total_price(), Money::from_minor(10_00, USD));

        Ok(())
    }

    #[test]
    fn edits_after_server_total_shift_that_total() -> TestResult {
        let mut line =
            RecipeLine::in_mealkit(LineId(1), RecipeId(5), "Bowl", lines()?, 1, None, USD)?
                .with_server_total(Money::from_minor(19_99, USD))?;

        assert_eq!(line.total_price(), Money::from_minor(19_99, USD));

        line.recompute_total()?;

        assert_eq!(line.total_price(), Money::from_minor(19_99, USD));

        line.remove_ingredient(LineId(10));
        line.recompute_total()?;

        assert_eq!(line.total_price(), Money::from_minor(9_99, USD));

        Ok(())
    }

    #[test]
    fn server_total_is_split_across_quantity() -> TestResult {
        let mut line =
            RecipeLine::in_mealkit(LineId(1), RecipeId(5), "Bowl", lines()?, 2, None, USD)?
                .with_server_total(Money::from_minor(30_00, USD))?;

        line.set_quantity(Quantity::new(3)?);
        line.recompute_total()?;

        assert_eq!(line.total_price(), Money::from_minor(45_00, USD));

        Ok(())
    }

    #[test]
    fn server_total_rejected_for_standalone_line() -> TestResult {
        let line = RecipeLine::standalone(LineId(1), RecipeId(5), "Bowl", lines()?, 1, USD)?;

        let result = line.with_server_total(Money::from_minor(1_00, USD));

        assert_eq!(result, Err(LineError::MisplacedRecipe(LineId(1))));

        Ok(())
    }
}
