//! Cart
//!
//! The root aggregate. It owns the product, recipe and mealkit collections and applies every
//! mutation atomically: changes are made on a draft of the affected top-level line, all totals
//! up to that line are recomputed, and only then is the draft committed.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    catalog::{IngredientSelection, Mealkit, PreparationType, Product, Recipe},
    lines::{
        IngredientLine, IngredientPath, LineError, LineId, LinePath, MealkitLine, ProductLine,
        Quantity, RecipeLine, RecipePath,
    },
    mutations::{CartAction, Mutation, NewLine},
    pricing::{PricingError, ensure_currency, total_price},
};

/// Errors raised by cart operations.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Quantity below one requested through an update; use removal instead.
    #[error("quantity must be at least 1, got {0}; remove the line instead")]
    InvalidQuantity(u32),

    /// Incrementing a quantity overflowed.
    #[error("quantity cannot exceed {}", u32::MAX)]
    QuantityOverflow,

    /// The addressed line does not exist.
    #[error("{0} is not in the cart")]
    LineNotFound(LinePath),

    /// A display name was empty.
    #[error("{0} line name cannot be empty")]
    EmptyName(&'static str),

    /// A recipe line's pricing does not match where it sits in the cart.
    #[error("recipe line {0} has the wrong pricing for its position in the cart")]
    MisplacedRecipe(LineId),

    /// Price resolution or aggregation failed, including incompatible preparation types.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl From<LineError> for CartError {
    fn from(error: LineError) -> Self {
        match error {
            LineError::InvalidQuantity(quantity) => Self::InvalidQuantity(quantity),
            LineError::QuantityOverflow => Self::QuantityOverflow,
            LineError::EmptyName(kind) => Self::EmptyName(kind),
            LineError::MisplacedRecipe(id) => Self::MisplacedRecipe(id),
            LineError::Pricing(error) => Self::Pricing(error),
        }
    }
}

/// Aggregate totals of a cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    /// Sum of the quantities of all top-level lines
    pub total_item: u64,

    /// Sum of the totals of all top-level lines
    pub total_price: Money<'static, Currency>,
}

/// Cart
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    currency: &'static Currency,
    products: Vec<ProductLine>,
    recipes: Vec<RecipeLine>,
    mealkits: Vec<MealkitLine>,
    next_id: u64,
}

impl Cart {
    /// Create an empty cart in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            products: Vec::new(),
            recipes: Vec::new(),
            mealkits: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a cart from existing lines, typically a server snapshot.
    ///
    /// Line totals are taken as they are; nothing is recomputed.
    ///
    /// # Errors
    ///
    /// - [`CartError::MisplacedRecipe`]: a top-level recipe line is bundle-priced.
    /// - [`CartError::Pricing`]: a line total is in another currency.
    pub fn from_lines(
        currency: &'static Currency,
        products: Vec<ProductLine>,
        recipes: Vec<RecipeLine>,
        mealkits: Vec<MealkitLine>,
    ) -> Result<Self, CartError> {
        if let Some(nested) = recipes.iter().find(|recipe| recipe.is_from_mealkit()) {
            return Err(CartError::MisplacedRecipe(nested.id()));
        }

        products
            .iter()
            .map(ProductLine::total_price)
            .chain(recipes.iter().map(RecipeLine::total_price))
            .chain(mealkits.iter().map(MealkitLine::total_price))
            .try_for_each(|price| ensure_currency(&price, currency))?;

        let next_id = products
            .iter()
            .map(ProductLine::id)
            .chain(recipes.iter().map(RecipeLine::max_line_id))
            .chain(mealkits.iter().map(MealkitLine::max_line_id))
            .max()
            .map_or(1, |LineId(id)| id.saturating_add(1));

        Ok(Self {
            currency,
            products,
            recipes,
            mealkits,
            next_id,
        })
    }

    /// Currency of every price in the cart
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Product lines, in insertion order
    pub fn products(&self) -> &[ProductLine] {
        &self.products
    }

    /// Standalone recipe lines, in insertion order
    pub fn recipes(&self) -> &[RecipeLine] {
        &self.recipes
    }

    /// Mealkit lines, in insertion order
    pub fn mealkits(&self) -> &[MealkitLine] {
        &self.mealkits
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.recipes.is_empty() && self.mealkits.is_empty()
    }

    /// Looks up a product line.
    pub fn product(&self, id: LineId) -> Option<&ProductLine> {
        self.products.iter().find(|line| line.id() == id)
    }

    /// Looks up a mealkit line.
    pub fn mealkit(&self, id: LineId) -> Option<&MealkitLine> {
        self.mealkits.iter().find(|line| line.id() == id)
    }

    /// Looks up a recipe line, standalone or nested.
    pub fn recipe(&self, path: RecipePath) -> Option<&RecipeLine> {
        match path {
            RecipePath::Standalone(id) => self.recipes.iter().find(|line| line.id() == id),
            RecipePath::InMealkit { mealkit, recipe } => self.mealkit(mealkit)?.recipe(recipe),
        }
    }

    /// Looks up an ingredient line.
    pub fn ingredient(&self, path: IngredientPath) -> Option<&IngredientLine> {
        self.recipe(path.recipe)?.ingredient(path.ingredient)
    }

    /// Quantity of any line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the line does not exist.
    pub fn quantity_of(&self, path: LinePath) -> Result<Quantity, CartError> {
        let quantity = match path {
            LinePath::Product(id) => self.product(id).map(ProductLine::quantity),
            LinePath::Recipe(recipe) => self.recipe(recipe).map(RecipeLine::quantity),
            LinePath::Mealkit(id) => self.mealkit(id).map(MealkitLine::quantity),
            LinePath::Ingredient(ingredient) => {
                self.ingredient(ingredient).map(IngredientLine::quantity)
            }
        };

        quantity.ok_or(CartError::LineNotFound(path))
    }

    /// Appends a product line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::Pricing`]: the product is priced in another currency.
    pub fn add_product(&mut self, product: Product, quantity: u32) -> Result<LineId, CartError> {
        self.insert_product(product, Quantity::new(quantity)?)
    }

    /// Appends a standalone recipe line built from the given selections.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::Pricing`]: a preparation type does not fit its ingredient, or a price is
    ///   in another currency.
    pub fn add_recipe(
        &mut self,
        recipe: &Recipe,
        selections: Vec<IngredientSelection>,
        quantity: u32,
    ) -> Result<LineId, CartError> {
        self.insert_recipe(recipe, selections, Quantity::new(quantity)?)
    }

    /// Appends a mealkit line with its default recipe composition.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::Pricing`]: a price is in another currency.
    pub fn add_mealkit(&mut self, mealkit: &Mealkit, quantity: u32) -> Result<LineId, CartError> {
        self.insert_mealkit(mealkit, Quantity::new(quantity)?)
    }

    /// Appends an ingredient line to an existing recipe line.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`]: the recipe line does not exist.
    /// - [`CartError::Pricing`]: the preparation type does not fit the ingredient.
    pub fn add_ingredient(
        &mut self,
        recipe: RecipePath,
        selection: IngredientSelection,
    ) -> Result<LineId, CartError> {
        let id = self.peek_id();

        self.edit_recipe(recipe, |line| {
            line.push_ingredient(IngredientLine::from_selection(id, selection)?);

            Ok(())
        })?;

        Ok(self.commit_id())
    }

    /// Sets the quantity of any line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `new_quantity` is zero; the cart is not changed.
    /// - [`CartError::LineNotFound`]: the line does not exist.
    pub fn update_quantity(&mut self, path: LinePath, new_quantity: u32) -> Result<(), CartError> {
        self.set_quantity(path, Quantity::new(new_quantity)?)
    }

    /// Raises a line's quantity by one and returns the new quantity.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`]: the line does not exist.
    /// - [`CartError::QuantityOverflow`]: the line is at the maximum quantity.
    pub fn increment(&mut self, path: LinePath) -> Result<Quantity, CartError> {
        let quantity = self.quantity_of(path)?.incremented()?;

        self.set_quantity(path, quantity)?;

        Ok(quantity)
    }

    /// Lowers a line's quantity by one, removing the line at quantity one.
    ///
    /// Returns the new quantity, or `None` if the line was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the line does not exist.
    pub fn decrement(&mut self, path: LinePath) -> Result<Option<Quantity>, CartError> {
        match self.quantity_of(path)?.decremented() {
            Some(quantity) => {
                self.set_quantity(path, quantity)?;

                Ok(Some(quantity))
            }
            None => {
                self.remove_line(path)?;

                Ok(None)
            }
        }
    }

    /// Changes or clears an ingredient line's preparation type.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`]: the ingredient line does not exist.
    /// - [`CartError::Pricing`]: the preparation type does not fit the ingredient.
    pub fn set_preparation(
        &mut self,
        path: IngredientPath,
        preparation: Option<PreparationType>,
    ) -> Result<(), CartError> {
        self.edit_recipe(path.recipe, |recipe| {
            recipe
                .ingredient_mut(path.ingredient)
                .ok_or(CartError::LineNotFound(LinePath::Ingredient(path)))?
                .set_preparation(preparation)?;

            Ok(())
        })
    }

    /// Removes a line and recomputes its ancestors.
    ///
    /// Removing a recipe nested in a mealkit only removes that recipe line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the line does not exist.
    pub fn remove_line(&mut self, path: LinePath) -> Result<(), CartError> {
        let not_found = CartError::LineNotFound(path);

        match path {
            LinePath::Product(id) => {
                let index = self
                    .products
                    .iter()
                    .position(|line| line.id() == id)
                    .ok_or(not_found)?;

                self.products.remove(index);
            }
            LinePath::Recipe(RecipePath::Standalone(id)) => {
                let index = self
                    .recipes
                    .iter()
                    .position(|line| line.id() == id)
                    .ok_or(not_found)?;

                self.recipes.remove(index);
            }
            LinePath::Recipe(RecipePath::InMealkit { mealkit, recipe }) => {
                self.edit_mealkit(mealkit, path, |line| {
                    line.remove_recipe(recipe).map(drop).ok_or(not_found)
                })?;
            }
            LinePath::Mealkit(id) => {
                let index = self
                    .mealkits
                    .iter()
                    .position(|line| line.id() == id)
                    .ok_or(not_found)?;

                self.mealkits.remove(index);
            }
            LinePath::Ingredient(ingredient) => {
                self.edit_recipe(ingredient.recipe, |line| {
                    line.remove_ingredient(ingredient.ingredient)
                        .map(drop)
                        .ok_or(not_found)
                })?;
            }
        }

        Ok(())
    }

    /// Totals across all three collections, recomputed on every call.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] if the sum overflows.
    pub fn totals(&self) -> Result<CartTotals, CartError> {
        let total_item = self
            .products
            .iter()
            .map(ProductLine::quantity)
            .chain(self.recipes.iter().map(RecipeLine::quantity))
            .chain(self.mealkits.iter().map(MealkitLine::quantity))
            .map(|quantity| u64::from(quantity.get()))
            .sum();

        let total_price = total_price(
            self.products
                .iter()
                .map(ProductLine::total_price)
                .chain(self.recipes.iter().map(RecipeLine::total_price))
                .chain(self.mealkits.iter().map(MealkitLine::total_price)),
            self.currency,
        )?;

        Ok(CartTotals {
            total_item,
            total_price,
        })
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.products.clear();
        self.recipes.clear();
        self.mealkits.clear();
    }

    /// Resolves an action against the current cart into a concrete mutation.
    ///
    /// Increments and decrements become quantity updates, and a decrement at one becomes a
    /// removal. Nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the action could not be applied to this cart.
    pub fn resolve(&self, action: CartAction) -> Result<Mutation, CartError> {
        let mutation = match action {
            CartAction::Add(line) => Mutation::Add(line),
            CartAction::Increment(target) => Mutation::SetQuantity {
                target,
                quantity: self.quantity_of(target)?.incremented()?,
            },
            CartAction::Decrement(target) => match self.quantity_of(target)?.decremented() {
                Some(quantity) => Mutation::SetQuantity { target, quantity },
                None => Mutation::Remove { target },
            },
            CartAction::SetQuantity(target, quantity) => Mutation::SetQuantity {
                target,
                quantity: Quantity::new(quantity)?,
            },
            CartAction::Remove(target) => Mutation::Remove { target },
            CartAction::SetPreparation(target, preparation) => Mutation::SetPreparation {
                target,
                preparation,
            },
        };

        self.validate(&mutation)?;

        Ok(mutation)
    }

    /// Checks that a mutation would apply cleanly, without changing the cart.
    ///
    /// # Errors
    ///
    /// Returns the [`CartError`] that [`Cart::apply`] would return.
    pub fn validate(&self, mutation: &Mutation) -> Result<(), CartError> {
        self.clone().apply(mutation).map(drop)
    }

    /// Applies a mutation. Returns the identifier of the new line for additions.
    ///
    /// Either the whole mutation applies, with every ancestor total recomputed, or the cart is
    /// left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the mutation could not be applied.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<Option<LineId>, CartError> {
        match mutation {
            Mutation::Add(NewLine::Product { product, quantity }) => {
                self.insert_product(product.clone(), *quantity).map(Some)
            }
            Mutation::Add(NewLine::Recipe {
                recipe,
                selections,
                quantity,
            }) => self
                .insert_recipe(recipe, selections.clone(), *quantity)
                .map(Some),
            Mutation::Add(NewLine::Mealkit { mealkit, quantity }) => {
                self.insert_mealkit(mealkit, *quantity).map(Some)
            }
            Mutation::Add(NewLine::Ingredient { recipe, selection }) => {
                self.add_ingredient(*recipe, selection.clone()).map(Some)
            }
            Mutation::SetQuantity { target, quantity } => {
                self.set_quantity(*target, *quantity).map(|()| None)
            }
            Mutation::Remove { target } => self.remove_line(*target).map(|()| None),
            Mutation::SetPreparation {
                target,
                preparation,
            } => self
                .set_preparation(*target, preparation.clone())
                .map(|()| None),
        }
    }

    fn insert_product(&mut self, product: Product, quantity: Quantity) -> Result<LineId, CartError> {
        ensure_currency(product.price(), self.currency)?;

        let line = ProductLine::new(self.peek_id(), product, quantity.get())?;

        self.products.push(line);

        Ok(self.commit_id())
    }

    fn insert_recipe(
        &mut self,
        recipe: &Recipe,
        selections: Vec<IngredientSelection>,
        quantity: Quantity,
    ) -> Result<LineId, CartError> {
        let mut ids = self.peek_id().0..;
        let id = LineId(ids.next().unwrap_or_default());

        let ingredients = selections
            .into_iter()
            .zip(ids.by_ref())
            .map(|(selection, id)| IngredientLine::from_selection(LineId(id), selection))
            .collect::<Result<Vec<_>, _>>()?;

        let line = RecipeLine::standalone(
            id,
            recipe.id(),
            recipe.name(),
            ingredients,
            quantity.get(),
            self.currency,
        )?;

        self.recipes.push(line);
        self.next_id = ids.next().unwrap_or(u64::MAX);

        Ok(id)
    }

    fn insert_mealkit(&mut self, mealkit: &Mealkit, quantity: Quantity) -> Result<LineId, CartError> {
        let currency = self.currency;

        ensure_currency(mealkit.price(), currency)?;

        let mut ids = self.peek_id().0..;
        let id = LineId(ids.next().unwrap_or_default());

        let recipes = mealkit
            .recipes()
            .iter()
            .map(|recipe| -> Result<RecipeLine, LineError> {
                let recipe_id = LineId(ids.next().unwrap_or_default());

                let ingredients = recipe
                    .ingredients()
                    .iter()
                    .cloned()
                    .zip(ids.by_ref())
                    .map(|(selection, id)| IngredientLine::from_selection(LineId(id), selection))
                    .collect::<Result<Vec<_>, _>>()?;

                RecipeLine::in_mealkit(
                    recipe_id,
                    recipe.id(),
                    recipe.name(),
                    ingredients,
                    1,
                    None,
                    currency,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let line = MealkitLine::new(
            id,
            mealkit.id(),
            mealkit.name(),
            recipes,
            quantity.get(),
            *mealkit.price(),
        )?;

        self.mealkits.push(line);
        self.next_id = ids.next().unwrap_or(u64::MAX);

        Ok(id)
    }

    fn set_quantity(&mut self, path: LinePath, quantity: Quantity) -> Result<(), CartError> {
        match path {
            LinePath::Product(id) => {
                let line = self
                    .products
                    .iter_mut()
                    .find(|line| line.id() == id)
                    .ok_or(CartError::LineNotFound(path))?;

                line.set_quantity(quantity)?;

                Ok(())
            }
            LinePath::Recipe(recipe) => self.edit_recipe(recipe, |line| {
                line.set_quantity(quantity);

                Ok(())
            }),
            LinePath::Mealkit(id) => self.edit_mealkit(id, path, |line| {
                line.set_quantity(quantity);

                Ok(())
            }),
            LinePath::Ingredient(ingredient) => self.edit_recipe(ingredient.recipe, |line| {
                line.ingredient_mut(ingredient.ingredient)
                    .ok_or(CartError::LineNotFound(path))?
                    .set_quantity(quantity)?;

                Ok(())
            }),
        }
    }

    /// Edits a draft of a recipe line, recomputes it (and its mealkit, if nested) and commits.
    fn edit_recipe<F>(&mut self, path: RecipePath, edit: F) -> Result<(), CartError>
    where
        F: FnOnce(&mut RecipeLine) -> Result<(), CartError>,
    {
        let not_found = || CartError::LineNotFound(LinePath::Recipe(path));

        match path {
            RecipePath::Standalone(id) => {
                let slot = self
                    .recipes
                    .iter_mut()
                    .find(|line| line.id() == id)
                    .ok_or_else(not_found)?;

                let mut draft = slot.clone();

                edit(&mut draft)?;
                draft.recompute_total()?;

                *slot = draft;
            }
            RecipePath::InMealkit { mealkit, recipe } => {
                let slot = self
                    .mealkits
                    .iter_mut()
                    .find(|line| line.id() == mealkit)
                    .ok_or_else(not_found)?;

                let mut draft = slot.clone();
                let nested = draft.recipe_mut(recipe).ok_or_else(not_found)?;

                edit(nested)?;
                nested.recompute_total()?;
                draft.recompute_total()?;

                *slot = draft;
            }
        }

        Ok(())
    }

    /// Edits a draft of a mealkit line, recomputes it and commits.
    fn edit_mealkit<F>(&mut self, id: LineId, path: LinePath, edit: F) -> Result<(), CartError>
    where
        F: FnOnce(&mut MealkitLine) -> Result<(), CartError>,
    {
        let slot = self
            .mealkits
            .iter_mut()
            .find(|line| line.id() == id)
            .ok_or(CartError::LineNotFound(path))?;

        let mut draft = slot.clone();

        edit(&mut draft)?;
        draft.recompute_total()?;

        *slot = draft;

        Ok(())
    }

    fn peek_id(&self) -> LineId {
        LineId(self.next_id)
    }

    fn commit_id(&mut self) -> LineId {
        let id = LineId(self.next_id);

        self.next_id = self.next_id.saturating_add(1);

        id
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::{GBP, USD};
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::catalog::{
        Ingredient, IngredientCategory, IngredientId, MealkitId, PreparationTypeId, ProductId,
        RecipeId,
    };

    use super::*;

    fn chicken() -> TestResult<Ingredient> {
        Ok(Ingredient::new(
            IngredientId(1),
            "Chicken breast",
            IngredientCategory::new("poultry"),
            Decimal::new(200, 0),
            "g",
            Money::from_minor(5_00, USD),
        )?)
    }

    fn grilled() -> TestResult<PreparationType> {
        Ok(PreparationType::new(
            PreparationTypeId(2),
            "Grilled",
            IngredientCategory::new("poultry"),
            Money::from_minor(1_50, USD),
        )?)
    }

    fn diced() -> TestResult<PreparationType> {
        Ok(PreparationType::new(
            PreparationTypeId(3),
            "Diced",
            IngredientCategory::new("vegetable"),
            Money::from_minor(50, USD),
        )?)
    }

    fn bread() -> TestResult<Product> {
        Ok(Product::new(
            ProductId(1),
            "Sourdough",
            smallvec!["vegan".to_string()],
            Money::from_minor(4_00, USD),
        )?)
    }

    fn bowl() -> TestResult<Recipe> {
        Ok(Recipe::new(
            RecipeId(5),
            "Chicken bowl",
            vec![
                IngredientSelection::plain(chicken()?, Quantity::new(2)?),
                IngredientSelection::prepared(chicken()?, grilled()?, Quantity::new(2)?),
            ],
        )?)
    }

    fn weeknight() -> TestResult<Mealkit> {
        Ok(Mealkit::new(
            MealkitId(9),
            "Weeknight",
            vec![bowl()?],
            Money::from_minor(20_00, USD),
        )?)
    }

    #[test]
    fn adding_the_same_product_twice_creates_two_lines() -> TestResult {
        let mut cart = Cart::new(USD);

        let first = cart.add_product(bread()?, 1)?;
        let second = cart.add_product(bread()?, 1)?;

        assert_ne!(first, second);
        assert_eq!(cart.products().len(), 2);

        Ok(())
    }

    #[test]
    fn recipe_total_is_sum_of_ingredient_prices() -> TestResult {
        let mut cart = Cart::new(USD);
        let recipe = bowl()?;

        let id = cart.add_recipe(&recipe, recipe.ingredients().to_vec(), 1)?;
        let line = cart
            .recipe(RecipePath::Standalone(id))
            .ok_or("recipe line missing")?;

        assert_eq!(line.total_price(), Money::from_minor(23_00, USD));

        Ok(())
    }

    #[test]
    fn add_with_zero_quantity_is_rejected() -> TestResult {
        let mut cart = Cart::new(USD);

        assert_eq!(cart.add_product(bread()?, 0), Err(CartError::InvalidQuantity(0)));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn add_in_other_currency_is_rejected() -> TestResult {
        let mut cart = Cart::new(GBP);

        let result = cart.add_product(bread()?, 1);

        assert_eq!(
            result,
            Err(CartError::Pricing(PricingError::CurrencyMismatch("USD", "GBP")))
        );

        Ok(())
    }

    #[test]
    fn update_quantity_to_zero_changes_nothing() -> TestResult {
        let mut cart = Cart::new(USD);
        let id = cart.add_product(bread()?, 2)?;
        let before = cart.clone();

        let result = cart.update_quantity(LinePath::Product(id), 0);

        assert_eq!(result, Err(CartError::InvalidQuantity(0)));
        assert_eq!(cart, before);

        Ok(())
    }

    #[test]
    fn decrement_at_one_removes_line() -> TestResult {
        let mut cart = Cart::new(USD);
        let id = cart.add_product(bread()?, 1)?;

        assert_eq!(cart.decrement(LinePath::Product(id))?, None);
        assert!(cart.product(id).is_none());
        assert_eq!(cart.totals()?.total_item, 0);

        Ok(())
    }

    #[test]
    fn incompatible_preparation_is_rejected_atomically() -> TestResult {
        let mut cart = Cart::new(USD);
        let recipe = bowl()?;
        let id = cart.add_recipe(&recipe, recipe.ingredients().to_vec(), 1)?;
        let ingredient = cart
            .recipe(RecipePath::Standalone(id))
            .and_then(|line| line.ingredients().first())
            .map(IngredientLine::id)
            .ok_or("ingredient line missing")?;
        let before = cart.clone();

        let result = cart.set_preparation(
            IngredientPath {
                recipe: RecipePath::Standalone(id),
                ingredient,
            },
            Some(diced()?),
        );

        assert!(
            matches!(
                result,
                Err(CartError::Pricing(PricingError::InvalidPreparationType { .. }))
            ),
            "expected InvalidPreparationType, got {result:?}"
        );
        assert_eq!(cart, before);

        Ok(())
    }

    #[test]
    fn removing_nested_recipe_keeps_mealkit() -> TestResult {
        let mut cart = Cart::new(USD);
        let mealkit = cart.add_mealkit(&weeknight()?, 1)?;
        let recipe = cart
            .mealkit(mealkit)
            .and_then(|line| line.recipes().first())
            .map(RecipeLine::id)
            .ok_or("nested recipe missing")?;

        cart.remove_line(LinePath::Recipe(RecipePath::InMealkit { mealkit, recipe }))?;

        let line = cart.mealkit(mealkit).ok_or("mealkit removed")?;

        assert!(line.recipes().is_empty());
        assert_eq!(line.total_price(), Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn mealkit_total_uses_bundle_price() -> TestResult {
        let mut cart = Cart::new(USD);

        cart.add_mealkit(&weeknight()?, 2)?;

        let totals = cart.totals()?;

        assert_eq!(totals.total_item, 2);
        assert_eq!(totals.total_price, Money::from_minor(40_00, USD));

        Ok(())
    }

    #[test]
    fn line_ids_are_unique_across_nested_lines() -> TestResult {
        let mut cart = Cart::new(USD);
        let mealkit = cart.add_mealkit(&weeknight()?, 1)?;
        let product = cart.add_product(bread()?, 1)?;

        let line = cart.mealkit(mealkit).ok_or("mealkit missing")?;
        let mut ids = vec![line.id(), product];

        for recipe in line.recipes() {
            ids.push(recipe.id());
            ids.extend(recipe.ingredients().iter().map(IngredientLine::id));
        }

        let count = ids.len();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), count);

        Ok(())
    }

    #[test]
    fn resolve_turns_last_decrement_into_removal() -> TestResult {
        let mut cart = Cart::new(USD);
        let id = cart.add_product(bread()?, 1)?;
        let target = LinePath::Product(id);

        assert_eq!(
            cart.resolve(CartAction::Decrement(target))?,
            Mutation::Remove { target }
        );
        assert_eq!(
            cart.resolve(CartAction::Increment(target))?,
            Mutation::SetQuantity {
                target,
                quantity: Quantity::new(2)?
            }
        );

        Ok(())
    }

    #[test]
    fn resolve_rejects_missing_lines() {
        let cart = Cart::new(USD);
        let target = LinePath::Product(LineId(42));

        assert_eq!(
            cart.resolve(CartAction::Remove(target)),
            Err(CartError::LineNotFound(target))
        );
    }

    #[test]
    fn from_lines_rejects_nested_recipe_at_top_level() -> TestResult {
        let nested =
            RecipeLine::in_mealkit(LineId(3), RecipeId(5), "Bowl", Vec::new(), 1, None, USD)?;

        let result = Cart::from_lines(USD, Vec::new(), vec![nested], Vec::new());

        assert_eq!(result, Err(CartError::MisplacedRecipe(LineId(3))));

        Ok(())
    }

    #[test]
    fn from_lines_continues_ids_after_snapshot() -> TestResult {
        let product = ProductLine::new(LineId(41), bread()?, 1)?;
        let mut cart = Cart::from_lines(USD, vec![product], Vec::new(), Vec::new())?;

        assert_eq!(cart.add_product(bread()?, 1)?, LineId(42));

        Ok(())
    }
}
