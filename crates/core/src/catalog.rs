//! Catalog
//!
//! Immutable reference data the cart is composed from. Prices here are catalog prices; once a
//! line is in a cart the server snapshot, not the catalog, is authoritative.

use std::fmt;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::lines::Quantity;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id! {
    /// Ingredient identifier
    IngredientId
}

catalog_id! {
    /// Preparation type identifier
    PreparationTypeId
}

catalog_id! {
    /// Product identifier
    ProductId
}

catalog_id! {
    /// Recipe identifier
    RecipeId
}

catalog_id! {
    /// Mealkit identifier
    MealkitId
}

/// Dietary tags attached to a product (e.g. `vegan`, `gluten-free`).
pub type DietaryTags = SmallVec<[String; 4]>;

/// Errors raised while constructing catalog entries.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// A display name was empty.
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),

    /// A price or surcharge was below zero.
    #[error("{0} price cannot be negative")]
    NegativePrice(&'static str),

    /// An ingredient unit size was zero or negative.
    #[error("ingredient unit size must be positive, got {0}")]
    InvalidUnitSize(Decimal),
}

/// Ingredient category, used to match preparation types to ingredients.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientCategory(String);

impl IngredientCategory {
    /// Creates a category from its name. Names are compared case-insensitively.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// Category name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IngredientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ingredient
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    id: IngredientId,
    name: String,
    category: IngredientCategory,
    unit_size: Decimal,
    unit: String,
    price: Money<'static, Currency>,
}

impl Ingredient {
    /// Creates a new ingredient.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the name is empty, the unit size is not positive or the
    /// price is negative.
    pub fn new(
        id: IngredientId,
        name: impl Into<String>,
        category: IngredientCategory,
        unit_size: Decimal,
        unit: impl Into<String>,
        price: Money<'static, Currency>,
    ) -> Result<Self, CatalogError> {
        let name = non_empty(name.into(), "ingredient")?;

        if unit_size <= Decimal::ZERO {
            return Err(CatalogError::InvalidUnitSize(unit_size));
        }

        if price.to_minor_units() < 0 {
            return Err(CatalogError::NegativePrice("ingredient"));
        }

        Ok(Self {
            id,
            name,
            category,
            unit_size,
            unit: unit.into(),
            price,
        })
    }

    /// Ingredient identifier
    pub fn id(&self) -> IngredientId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category
    pub fn category(&self) -> &IngredientCategory {
        &self.category
    }

    /// Size of one unit, expressed in [`Ingredient::unit`]
    pub fn unit_size(&self) -> Decimal {
        self.unit_size
    }

    /// Unit type (e.g. `g`, `ml`, `pcs`)
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Base price per unit
    pub fn price(&self) -> &Money<'static, Currency> {
        &self.price
    }
}

/// Preparation type, an optional priced modifier for ingredients of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparationType {
    id: PreparationTypeId,
    name: String,
    category: IngredientCategory,
    surcharge: Money<'static, Currency>,
}

impl PreparationType {
    /// Creates a new preparation type.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the name is empty or the surcharge is negative.
    pub fn new(
        id: PreparationTypeId,
        name: impl Into<String>,
        category: IngredientCategory,
        surcharge: Money<'static, Currency>,
    ) -> Result<Self, CatalogError> {
        let name = non_empty(name.into(), "preparation type")?;

        if surcharge.to_minor_units() < 0 {
            return Err(CatalogError::NegativePrice("preparation type"));
        }

        Ok(Self {
            id,
            name,
            category,
            surcharge,
        })
    }

    /// Preparation type identifier
    pub fn id(&self) -> PreparationTypeId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ingredient category this preparation applies to
    pub fn category(&self) -> &IngredientCategory {
        &self.category
    }

    /// Additive surcharge per ingredient unit
    pub fn surcharge(&self) -> &Money<'static, Currency> {
        &self.surcharge
    }
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    tags: DietaryTags,
    price: Money<'static, Currency>,
}

impl Product {
    /// Creates a new product.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the name is empty or the price is negative.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        tags: DietaryTags,
        price: Money<'static, Currency>,
    ) -> Result<Self, CatalogError> {
        let name = non_empty(name.into(), "product")?;

        if price.to_minor_units() < 0 {
            return Err(CatalogError::NegativePrice("product"));
        }

        Ok(Self {
            id,
            name,
            tags,
            price,
        })
    }

    /// Product identifier
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dietary tags
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns true if the product carries the given dietary tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Unit price
    pub fn price(&self) -> &Money<'static, Currency> {
        &self.price
    }
}

/// One ingredient choice: which ingredient, how it is prepared, and how many units.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientSelection {
    /// Selected ingredient
    pub ingredient: Ingredient,

    /// Selected preparation, if any
    pub preparation: Option<PreparationType>,

    /// Number of ingredient units
    pub quantity: Quantity,
}

impl IngredientSelection {
    /// Selection of an ingredient without a preparation type.
    pub fn plain(ingredient: Ingredient, quantity: Quantity) -> Self {
        Self {
            ingredient,
            preparation: None,
            quantity,
        }
    }

    /// Selection of an ingredient prepared a specific way.
    pub fn prepared(ingredient: Ingredient, preparation: PreparationType, quantity: Quantity) -> Self {
        Self {
            ingredient,
            preparation: Some(preparation),
            quantity,
        }
    }
}

/// Recipe, with its default ingredient selections.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    id: RecipeId,
    name: String,
    ingredients: Vec<IngredientSelection>,
}

impl Recipe {
    /// Creates a new recipe.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyName`] if the name is empty.
    pub fn new(
        id: RecipeId,
        name: impl Into<String>,
        ingredients: Vec<IngredientSelection>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            id,
            name: non_empty(name.into(), "recipe")?,
            ingredients,
        })
    }

    /// Recipe identifier
    pub fn id(&self) -> RecipeId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default ingredient selections, in display order
    pub fn ingredients(&self) -> &[IngredientSelection] {
        &self.ingredients
    }
}

/// Mealkit, a priced bundle of recipes.
#[derive(Debug, Clone, PartialEq)]
pub struct Mealkit {
    id: MealkitId,
    name: String,
    recipes: Vec<Recipe>,
    price: Money<'static, Currency>,
}

impl Mealkit {
    /// Creates a new mealkit.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the name is empty or the price is negative.
    pub fn new(
        id: MealkitId,
        name: impl Into<String>,
        recipes: Vec<Recipe>,
        price: Money<'static, Currency>,
    ) -> Result<Self, CatalogError> {
        let name = non_empty(name.into(), "mealkit")?;

        if price.to_minor_units() < 0 {
            return Err(CatalogError::NegativePrice("mealkit"));
        }

        Ok(Self {
            id,
            name,
            recipes,
            price,
        })
    }

    /// Mealkit identifier
    pub fn id(&self) -> MealkitId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recipes in the bundle, in display order
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Bundle price per mealkit
    pub fn price(&self) -> &Money<'static, Currency> {
        &self.price
    }
}

/// In-memory catalog lookup.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    ingredients: FxHashMap<IngredientId, Ingredient>,
    preparation_types: FxHashMap<PreparationTypeId, PreparationType>,
    products: FxHashMap<ProductId, Product>,
    recipes: FxHashMap<RecipeId, Recipe>,
    mealkits: FxHashMap<MealkitId, Mealkit>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an ingredient.
    pub fn insert_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.insert(ingredient.id(), ingredient);
    }

    /// Adds or replaces a preparation type.
    pub fn insert_preparation_type(&mut self, preparation: PreparationType) {
        self.preparation_types.insert(preparation.id(), preparation);
    }

    /// Adds or replaces a product.
    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.id(), product);
    }

    /// Adds or replaces a recipe.
    pub fn insert_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.id(), recipe);
    }

    /// Adds or replaces a mealkit.
    pub fn insert_mealkit(&mut self, mealkit: Mealkit) {
        self.mealkits.insert(mealkit.id(), mealkit);
    }

    /// Looks up an ingredient.
    pub fn ingredient(&self, id: IngredientId) -> Option<&Ingredient> {
        self.ingredients.get(&id)
    }

    /// Looks up a preparation type.
    pub fn preparation_type(&self, id: PreparationTypeId) -> Option<&PreparationType> {
        self.preparation_types.get(&id)
    }

    /// Looks up a product.
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    /// Looks up a recipe.
    pub fn recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(&id)
    }

    /// Looks up a mealkit.
    pub fn mealkit(&self, id: MealkitId) -> Option<&Mealkit> {
        self.mealkits.get(&id)
    }

    /// Preparation types applicable to an ingredient, ordered by identifier.
    pub fn preparation_types_for(&self, ingredient: &Ingredient) -> Vec<&PreparationType> {
        let mut matching: Vec<&PreparationType> = self
            .preparation_types
            .values()
            .filter(|preparation| preparation.category() == ingredient.category())
            .collect();

        matching.sort_by_key(|preparation| preparation.id());

        matching
    }

    /// Products carrying a dietary tag, ordered by identifier.
    pub fn products_tagged(&self, tag: &str) -> Vec<&Product> {
        let mut matching: Vec<&Product> = self
            .products
            .values()
            .filter(|product| product.has_tag(tag))
            .collect();

        matching.sort_by_key(|product| product.id());

        matching
    }
}

fn non_empty(name: String, kind: &'static str) -> Result<String, CatalogError> {
    if name.trim().is_empty() {
        Err(CatalogError::EmptyName(kind))
    } else {
        Ok(name)
    }
}
