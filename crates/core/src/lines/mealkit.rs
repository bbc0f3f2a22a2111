//! Mealkit Lines

use rusty_money::{Money, iso::Currency};

use crate::{
    catalog::MealkitId,
    lines::{LineError, LineId, Quantity, RecipeLine},
    pricing::{adjusted_unit_price, ensure_currency, line_total, total_price, unit_share},
};

/// A mealkit bundle in the cart.
///
/// The bundle price comes from the server (it may include discounts the client cannot
/// reproduce). Local edits to nested recipes shift the unit price by the change in the
/// recipes' totals since that price was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct MealkitLine {
    id: LineId,
    mealkit_id: MealkitId,
    name: String,
    quantity: Quantity,
    recipes: Vec<RecipeLine>,
    unit_price: Money<'static, Currency>,
    anchor: Money<'static, Currency>,
    total_price: Money<'static, Currency>,
    currency: &'static Currency,
}

impl MealkitLine {
    /// Creates a mealkit line with the given bundle price per mealkit.
    ///
    /// # Errors
    ///
    /// - [`LineError::InvalidQuantity`]: `quantity` is zero.
    /// - [`LineError::EmptyName`]: `name` is empty.
    /// - [`LineError::MisplacedRecipe`]: a recipe line is priced as standalone.
    /// - [`LineError::Pricing`]: a price is in another currency.
    pub fn new(
        id: LineId,
        mealkit_id: MealkitId,
        name: impl Into<String>,
        recipes: Vec<RecipeLine>,
        quantity: u32,
        unit_price: Money<'static, Currency>,
    ) -> Result<Self, LineError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(LineError::EmptyName("mealkit"));
        }

        if let Some(standalone) = recipes.iter().find(|recipe| !recipe.is_from_mealkit()) {
            return Err(LineError::MisplacedRecipe(standalone.id()));
        }

        let currency = unit_price.currency();
        let quantity = Quantity::new(quantity)?;
        let anchor = total_price(recipes.iter().map(RecipeLine::total_price), currency)?;

        let mut line = Self {
            id,
            mealkit_id,
            name,
            quantity,
            recipes,
            unit_price,
            anchor,
            total_price: Money::from_minor(0, currency),
            currency,
        };

        line.recompute_total()?;

        Ok(line)
    }

    /// Replaces the cached total with a server-supplied one.
    ///
    /// The unit price is rebased on `total` and the anchor on the current recipe totals, so
    /// later edits shift the server total.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] if `total` is in another currency.
    pub fn with_server_total(mut self, total: Money<'static, Currency>) -> Result<Self, LineError> {
        ensure_currency(&total, self.currency)?;

        self.unit_price = unit_share(total, self.quantity)?;
        self.anchor = self.recipes_total()?;
        self.total_price = total;

        Ok(self)
    }

    /// Line identifier
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Catalog mealkit this line was built from
    pub fn mealkit_id(&self) -> MealkitId {
        self.mealkit_id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of mealkits
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Nested recipe lines, in display order
    pub fn recipes(&self) -> &[RecipeLine] {
        &self.recipes
    }

    /// Looks up a nested recipe line.
    pub fn recipe(&self, id: LineId) -> Option<&RecipeLine> {
        self.recipes.iter().find(|recipe| recipe.id() == id)
    }

    /// Bundle price per mealkit as last supplied
    pub fn unit_price(&self) -> Money<'static, Currency> {
        self.unit_price
    }

    /// Cached total price
    pub fn total_price(&self) -> Money<'static, Currency> {
        self.total_price
    }

    /// Recomputes the cached total from the (already current) nested recipe totals.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] on currency mismatch or overflow.
    pub fn recompute_total(&mut self) -> Result<(), LineError> {
        let components = self.recipes_total()?;
        let unit = adjusted_unit_price(self.unit_price, components, self.anchor)?;

        self.total_price = line_total(unit, self.quantity)?;

        Ok(())
    }

    fn recipes_total(&self) -> Result<Money<'static, Currency>, LineError> {
        Ok(total_price(
            self.recipes.iter().map(RecipeLine::total_price),
            self.currency,
        )?)
    }

    pub(crate) fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
    }

    pub(crate) fn recipe_mut(&mut self, id: LineId) -> Option<&mut RecipeLine> {
        self.recipes.iter_mut().find(|recipe| recipe.id() == id)
    }

    pub(crate) fn remove_recipe(&mut self, id: LineId) -> Option<RecipeLine> {
        let index = self.recipes.iter().position(|recipe| recipe.id() == id)?;

        Some(self.recipes.remove(index))
    }

    pub(crate) fn max_line_id(&self) -> LineId {
        self.recipes
            .iter()
            .map(RecipeLine::max_line_id)
            .chain(std::iter::once(self.id))
            .max()
            .unwrap_or(self.id)
    }
}
