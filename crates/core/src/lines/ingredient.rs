//! Ingredient Lines

use rusty_money::{Money, iso::Currency};

use crate::{
    catalog::{Ingredient, IngredientSelection, PreparationType},
    lines::{LineError, LineId, Quantity},
    pricing::{line_total, resolve_price},
};

/// An ingredient inside a recipe line.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientLine {
    id: LineId,
    ingredient: Ingredient,
    preparation: Option<PreparationType>,
    quantity: Quantity,
    price: Money<'static, Currency>,
}

impl IngredientLine {
    /// Creates an ingredient line and prices it.
    ///
    /// # Errors
    ///
    /// - [`LineError::InvalidQuantity`]: `quantity` is zero.
    /// - [`LineError::Pricing`]: the preparation type does not fit the ingredient.
    pub fn new(
        id: LineId,
        ingredient: Ingredient,
        preparation: Option<PreparationType>,
        quantity: u32,
    ) -> Result<Self, LineError> {
        let quantity = Quantity::new(quantity)?;
        let price = line_total(resolve_price(&ingredient, preparation.as_ref())?, quantity)?;

        Ok(Self {
            id,
            ingredient,
            preparation,
            quantity,
            price,
        })
    }

    /// Creates an ingredient line from a selection.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] if the preparation type does not fit the ingredient.
    pub fn from_selection(id: LineId, selection: IngredientSelection) -> Result<Self, LineError> {
        Self::new(
            id,
            selection.ingredient,
            selection.preparation,
            selection.quantity.get(),
        )
    }

    /// Line identifier
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Referenced ingredient
    pub fn ingredient(&self) -> &Ingredient {
        &self.ingredient
    }

    /// Selected preparation type
    pub fn preparation(&self) -> Option<&PreparationType> {
        self.preparation.as_ref()
    }

    /// Number of ingredient units
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Cached line price: unit price (with surcharge) times quantity
    pub fn price(&self) -> Money<'static, Currency> {
        self.price
    }

    /// Unit price including the preparation surcharge.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] if the preparation type does not fit the ingredient.
    pub fn unit_price(&self) -> Result<Money<'static, Currency>, LineError> {
        Ok(resolve_price(&self.ingredient, self.preparation.as_ref())?)
    }

    /// The selection this line represents.
    pub fn selection(&self) -> IngredientSelection {
        IngredientSelection {
            ingredient: self.ingredient.clone(),
            preparation: self.preparation.clone(),
            quantity: self.quantity,
        }
    }

    /// Recomputes the cached price.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::Pricing`] if the price cannot be resolved.
    pub fn recompute_total(&mut self) -> Result<(), LineError> {
        self.price = line_total(self.unit_price()?, self.quantity)?;

        Ok(())
    }

    pub(crate) fn set_quantity(&mut self, quantity: Quantity) -> Result<(), LineError> {
        let price = line_total(self.unit_price()?, quantity)?;

        self.quantity = quantity;
        self.price = price;

        Ok(())
    }

    pub(crate) fn set_preparation(
        &mut self,
        preparation: Option<PreparationType>,
    ) -> Result<(), LineError> {
        let price = line_total(
            resolve_price(&self.ingredient, preparation.as_ref())?,
            self.quantity,
        )?;

        self.preparation = preparation;
        self.price = price;

        Ok(())
    }
}
