//! Cart service wire format.
//!
//! Requests are tagged with the kind of item they touch; responses wrap a cart snapshot in a
//! `{success, message, data}` envelope. Prices travel as decimals in major units.

use mealcart::{
    cart::{Cart, CartError},
    catalog::{
        CatalogError, Ingredient, IngredientCategory, IngredientId, IngredientSelection, MealkitId,
        PreparationType, PreparationTypeId, Product, ProductId, RecipeId,
    },
    lines::{
        IngredientLine, IngredientPath, ItemType, LineError, LineId, LinePath, MealkitLine,
        ProductLine, Quantity, RecipeLine, RecipePath,
    },
    mutations::{Mutation, NewLine},
    pricing::{PricingError, money_from_decimal},
};
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Response envelope used by every cart service endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Whether the server accepted the request
    pub success: bool,

    /// Human-readable message, mostly on failure
    #[serde(default)]
    pub message: Option<String>,

    /// Payload
    pub data: Option<T>,
}

/// Errors converting a snapshot into a cart.
#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    /// A price could not be represented in the session currency.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A catalog entry in the snapshot is invalid.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A line in the snapshot is invalid.
    #[error(transparent)]
    Line(#[from] LineError),

    /// The lines do not form a valid cart.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Cart as returned by the cart service.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CartSnapshot {
    /// Product lines
    pub products: Vec<ProductSnapshot>,

    /// Standalone recipe lines
    pub recipes: Vec<RecipeSnapshot>,

    /// Mealkit lines
    pub mealkits: Vec<MealkitSnapshot>,
}

/// Product line in a snapshot
#[derive(Debug, Deserialize)]
pub struct ProductSnapshot {
    /// Line identifier
    pub cart_product_id: LineId,

    /// Catalog product
    pub product_id: ProductId,

    /// Product name
    pub name: String,

    /// Dietary tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Unit price
    pub price: Decimal,

    /// Number of units
    pub quantity: u32,
}

/// Ingredient as embedded in a snapshot
#[derive(Debug, Deserialize)]
pub struct IngredientRecord {
    /// Catalog identifier
    pub id: IngredientId,

    /// Ingredient name
    pub name: String,

    /// Ingredient category
    pub category: String,

    /// Size of one unit
    pub unit_size: Decimal,

    /// Unit type
    pub unit: String,

    /// Base price per unit
    pub price: Decimal,
}

/// Preparation type as embedded in a snapshot
#[derive(Debug, Deserialize)]
pub struct PreparationRecord {
    /// Catalog identifier
    pub id: PreparationTypeId,

    /// Preparation name
    pub name: String,

    /// Ingredient category it applies to
    pub category: String,

    /// Surcharge per unit
    pub surcharge: Decimal,
}

/// Ingredient line in a snapshot
#[derive(Debug, Deserialize)]
pub struct IngredientSnapshot {
    /// Line identifier
    pub cart_ingredient_id: LineId,

    /// Referenced ingredient
    pub ingredient: IngredientRecord,

    /// Selected preparation type
    #[serde(default)]
    pub preparation_type: Option<PreparationRecord>,

    /// Number of units
    pub quantity: u32,
}

/// Standalone recipe line in a snapshot
#[derive(Debug, Deserialize)]
pub struct RecipeSnapshot {
    /// Line identifier
    pub cart_recipe_id: LineId,

    /// Catalog recipe
    pub recipe_id: RecipeId,

    /// Recipe name
    pub name: String,

    /// Number of recipes
    pub quantity: u32,

    /// Ingredient lines
    #[serde(default)]
    pub ingredients: Vec<IngredientSnapshot>,
}

/// Recipe line nested in a mealkit snapshot
#[derive(Debug, Deserialize)]
pub struct MealkitRecipeSnapshot {
    /// Line identifier
    pub mealkit_recipe_id: LineId,

    /// Catalog recipe
    pub recipe_id: RecipeId,

    /// Recipe name
    pub name: String,

    /// Number of recipes
    #[serde(default = "one")]
    pub quantity: u32,

    /// Server unit price, when supplied
    #[serde(default)]
    pub price: Option<Decimal>,

    /// Server total
    pub total_price: Decimal,

    /// Ingredient lines
    #[serde(default)]
    pub ingredients: Vec<IngredientSnapshot>,
}

/// Mealkit line in a snapshot
#[derive(Debug, Deserialize)]
pub struct MealkitSnapshot {
    /// Line identifier
    pub cart_mealkit_id: LineId,

    /// Catalog mealkit
    pub mealkit_id: MealkitId,

    /// Mealkit name
    pub name: String,

    /// Number of mealkits
    pub quantity: u32,

    /// Bundle price per mealkit
    pub price: Decimal,

    /// Server total
    pub total_price: Decimal,

    /// Nested recipe lines
    #[serde(default)]
    pub recipes: Vec<MealkitRecipeSnapshot>,
}

fn one() -> u32 {
    1
}

impl CartSnapshot {
    /// Builds a cart from the snapshot, keeping server totals for bundle-priced lines.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if any price, entry or line is invalid.
    pub fn into_cart(self, currency: &'static Currency) -> Result<Cart, SnapshotError> {
        let products = self
            .products
            .into_iter()
            .map(|line| line.into_line(currency))
            .collect::<Result<Vec<_>, _>>()?;

        let recipes = self
            .recipes
            .into_iter()
            .map(|line| line.into_line(currency))
            .collect::<Result<Vec<_>, _>>()?;

        let mealkits = self
            .mealkits
            .into_iter()
            .map(|line| line.into_line(currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::from_lines(currency, products, recipes, mealkits)?)
    }
}

impl ProductSnapshot {
    fn into_line(self, currency: &'static Currency) -> Result<ProductLine, SnapshotError> {
        let product = Product::new(
            self.product_id,
            self.name,
            self.tags.into_iter().collect(),
            money_from_decimal(self.price, currency)?,
        )?;

        Ok(ProductLine::new(self.cart_product_id, product, self.quantity)?)
    }
}

impl IngredientSnapshot {
    fn into_line(self, currency: &'static Currency) -> Result<IngredientLine, SnapshotError> {
        let record = self.ingredient;

        let ingredient = Ingredient::new(
            record.id,
            record.name,
            IngredientCategory::new(record.category),
            record.unit_size,
            record.unit,
            money_from_decimal(record.price, currency)?,
        )?;

        let preparation = self
            .preparation_type
            .map(|record| -> Result<PreparationType, SnapshotError> {
                Ok(PreparationType::new(
                    record.id,
                    record.name,
                    IngredientCategory::new(record.category),
                    money_from_decimal(record.surcharge, currency)?,
                )?)
            })
            .transpose()?;

        Ok(IngredientLine::new(
            self.cart_ingredient_id,
            ingredient,
            preparation,
            self.quantity,
        )?)
    }
}

fn ingredient_lines(
    ingredients: Vec<IngredientSnapshot>,
    currency: &'static Currency,
) -> Result<Vec<IngredientLine>, SnapshotError> {
    ingredients
        .into_iter()
        .map(|line| line.into_line(currency))
        .collect()
}

impl RecipeSnapshot {
    fn into_line(self, currency: &'static Currency) -> Result<RecipeLine, SnapshotError> {
        Ok(RecipeLine::standalone(
            self.cart_recipe_id,
            self.recipe_id,
            self.name,
            ingredient_lines(self.ingredients, currency)?,
            self.quantity,
            currency,
        )?)
    }
}

impl MealkitRecipeSnapshot {
    fn into_line(self, currency: &'static Currency) -> Result<RecipeLine, SnapshotError> {
        let unit_price = self
            .price
            .map(|price| money_from_decimal(price, currency))
            .transpose()?;

        let line = RecipeLine::in_mealkit(
            self.mealkit_recipe_id,
            self.recipe_id,
            self.name,
            ingredient_lines(self.ingredients, currency)?,
            self.quantity,
            unit_price,
            currency,
        )?;

        Ok(line.with_server_total(money_from_decimal(self.total_price, currency)?)?)
    }
}

impl MealkitSnapshot {
    fn into_line(self, currency: &'static Currency) -> Result<MealkitLine, SnapshotError> {
        let recipes = self
            .recipes
            .into_iter()
            .map(|line| line.into_line(currency))
            .collect::<Result<Vec<_>, _>>()?;

        let line = MealkitLine::new(
            self.cart_mealkit_id,
            self.mealkit_id,
            self.name,
            recipes,
            self.quantity,
            money_from_decimal(self.price, currency)?,
        )?;

        Ok(line.with_server_total(money_from_decimal(self.total_price, currency)?)?)
    }
}

/// `POST /cart` body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum AddItem {
    /// Add a product
    Product {
        /// Catalog product
        item_id: ProductId,
        /// Number of units
        quantity: Quantity,
    },

    /// Add a standalone recipe
    Recipe {
        /// Catalog recipe
        item_id: RecipeId,
        /// Ingredient selections
        item_data: RecipeData,
        /// Number of recipes
        quantity: Quantity,
    },

    /// Add a mealkit
    Mealkit {
        /// Catalog mealkit
        item_id: MealkitId,
        /// Recipes with their ingredient selections
        item_data: MealkitData,
        /// Number of mealkits
        quantity: Quantity,
    },

    /// Add an ingredient to a recipe line
    Ingredient {
        /// Catalog ingredient
        item_id: IngredientId,
        /// Receiving recipe line and preparation type
        item_data: IngredientData,
        /// Number of units
        quantity: Quantity,
    },
}

/// Ingredient selections of a recipe being added
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeData {
    /// Selections, in display order
    pub ingredients: Vec<SelectionData>,
}

/// Recipes of a mealkit being added
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealkitData {
    /// Recipes, in display order
    pub recipes: Vec<MealkitRecipeData>,
}

/// One recipe of a mealkit being added
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealkitRecipeData {
    /// Catalog recipe
    pub recipe_id: RecipeId,

    /// Ingredient selections, in display order
    pub ingredients: Vec<SelectionData>,
}

/// One ingredient selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionData {
    /// Catalog ingredient
    pub ingredient_id: IngredientId,

    /// Selected preparation type, `null` when none
    pub preparation_type_id: Option<PreparationTypeId>,

    /// Number of units
    pub quantity: Quantity,
}

/// Where an added ingredient goes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientData {
    /// Receiving recipe line
    #[serde(flatten)]
    pub recipe: RecipeRef,

    /// Selected preparation type, `null` when none
    pub preparation_type_id: Option<PreparationTypeId>,
}

/// Reference to a recipe line on the server
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecipeRef {
    /// Standalone recipe line
    Standalone {
        /// Recipe line
        cart_recipe_id: LineId,
    },

    /// Recipe line inside a mealkit line
    InMealkit {
        /// Mealkit line
        cart_mealkit_id: LineId,
        /// Nested recipe line
        mealkit_recipe_id: LineId,
    },
}

impl From<RecipePath> for RecipeRef {
    fn from(path: RecipePath) -> Self {
        match path {
            RecipePath::Standalone(cart_recipe_id) => Self::Standalone { cart_recipe_id },
            RecipePath::InMealkit { mealkit, recipe } => Self::InMealkit {
                cart_mealkit_id: mealkit,
                mealkit_recipe_id: recipe,
            },
        }
    }
}

/// `PUT /cart` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateItem {
    /// Kind of line
    pub item_type: ItemType,

    /// Line identifier
    pub item_id: LineId,

    /// New quantity
    pub quantity: Quantity,

    /// Preparation change: absent to keep it, `null` to clear it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_type_id: Option<Option<PreparationTypeId>>,
}

/// `DELETE /cart` body
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum DeleteItem {
    /// Remove a product line
    Product {
        /// Line identifier
        cart_product_id: LineId,
    },

    /// Remove a recipe line
    Recipe {
        /// Line identifier
        cart_recipe_id: LineId,
        /// Owning mealkit line, for nested recipes
        #[serde(skip_serializing_if = "Option::is_none")]
        cart_mealkit_id: Option<LineId>,
    },

    /// Remove a mealkit line
    Mealkit {
        /// Line identifier
        cart_mealkit_id: LineId,
    },

    /// Remove an ingredient line
    Ingredient {
        /// Line identifier
        cart_ingredient_id: LineId,
    },
}

/// One cart service call.
#[derive(Debug, Clone, PartialEq)]
pub enum CartRequest {
    /// `POST /cart`
    Add(AddItem),

    /// `PUT /cart`
    Update(UpdateItem),

    /// `DELETE /cart`
    Delete(DeleteItem),
}

impl CartRequest {
    /// Translates a mutation into the request that performs it on the server.
    ///
    /// `cart` must be the cart the mutation was resolved against.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if a preparation change targets a missing line.
    pub fn from_mutation(mutation: &Mutation, cart: &Cart) -> Result<Self, CartError> {
        let request = match mutation {
            Mutation::Add(line) => Self::Add(add_item(line)),
            Mutation::SetQuantity { target, quantity } => Self::Update(UpdateItem {
                item_type: target.item_type(),
                item_id: target.line_id(),
                quantity: *quantity,
                preparation_type_id: None,
            }),
            Mutation::SetPreparation {
                target,
                preparation,
            } => Self::Update(UpdateItem {
                item_type: ItemType::Ingredient,
                item_id: target.ingredient,
                quantity: cart.quantity_of(LinePath::Ingredient(*target))?,
                preparation_type_id: Some(preparation.as_ref().map(PreparationType::id)),
            }),
            Mutation::Remove { target } => Self::Delete(delete_item(*target)),
        };

        Ok(request)
    }

    /// Kind of item the request touches
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Add(AddItem::Product { .. }) => ItemType::Product,
            Self::Add(AddItem::Recipe { .. }) => ItemType::Recipe,
            Self::Add(AddItem::Mealkit { .. }) => ItemType::Mealkit,
            Self::Add(AddItem::Ingredient { .. }) => ItemType::Ingredient,
            Self::Update(update) => update.item_type,
            Self::Delete(DeleteItem::Product { .. }) => ItemType::Product,
            Self::Delete(DeleteItem::Recipe { .. }) => ItemType::Recipe,
            Self::Delete(DeleteItem::Mealkit { .. }) => ItemType::Mealkit,
            Self::Delete(DeleteItem::Ingredient { .. }) => ItemType::Ingredient,
        }
    }

    /// HTTP method name
    pub fn method(&self) -> &'static str {
        match self {
            Self::Add(_) => "POST",
            Self::Update(_) => "PUT",
            Self::Delete(_) => "DELETE",
        }
    }
}

fn add_item(line: &NewLine) -> AddItem {
    match line {
        NewLine::Product { product, quantity } => AddItem::Product {
            item_id: product.id(),
            quantity: *quantity,
        },
        NewLine::Recipe {
            recipe,
            selections,
            quantity,
        } => AddItem::Recipe {
            item_id: recipe.id(),
            item_data: RecipeData {
                ingredients: selection_data(selections),
            },
            quantity: *quantity,
        },
        NewLine::Mealkit { mealkit, quantity } => AddItem::Mealkit {
            item_id: mealkit.id(),
            item_data: MealkitData {
                recipes: mealkit
                    .recipes()
                    .iter()
                    .map(|recipe| MealkitRecipeData {
                        recipe_id: recipe.id(),
                        ingredients: selection_data(recipe.ingredients()),
                    })
                    .collect(),
            },
            quantity: *quantity,
        },
        NewLine::Ingredient { recipe, selection } => AddItem::Ingredient {
            item_id: selection.ingredient.id(),
            item_data: IngredientData {
                recipe: RecipeRef::from(*recipe),
                preparation_type_id: selection.preparation.as_ref().map(PreparationType::id),
            },
            quantity: selection.quantity,
        },
    }
}

fn selection_data(selections: &[IngredientSelection]) -> Vec<SelectionData> {
    selections
        .iter()
        .map(|selection| SelectionData {
            ingredient_id: selection.ingredient.id(),
            preparation_type_id: selection.preparation.as_ref().map(PreparationType::id),
            quantity: selection.quantity,
        })
        .collect()
}

fn delete_item(target: LinePath) -> DeleteItem {
    match target {
        LinePath::Product(cart_product_id) => DeleteItem::Product { cart_product_id },
        LinePath::Recipe(path) => DeleteItem::Recipe {
            cart_recipe_id: path.line_id(),
            cart_mealkit_id: path.bundle(),
        },
        LinePath::Mealkit(cart_mealkit_id) => DeleteItem::Mealkit { cart_mealkit_id },
        LinePath::Ingredient(IngredientPath { ingredient, .. }) => DeleteItem::Ingredient {
            cart_ingredient_id: ingredient,
        },
    }
}
