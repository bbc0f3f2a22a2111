//! Fixtures
//!
//! Catalogs described in YAML, used by tests and the command line client.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    catalog::{
        Catalog, CatalogError, Ingredient, IngredientSelection, Mealkit, PreparationType, Product,
        Recipe,
    },
    fixtures::catalog::{CatalogFixture, MealkitFixture, RecipeFixture},
    lines::{LineError, Quantity},
};

pub mod catalog;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Invalid catalog entry
    #[error("Invalid catalog entry: {0}")]
    Catalog(#[from] CatalogError),

    /// Invalid selection quantity
    #[error("Invalid quantity for ingredient {ingredient} in recipe {recipe}: {source}")]
    InvalidQuantity {
        /// Recipe key
        recipe: String,
        /// Ingredient key
        ingredient: String,
        /// Underlying error
        source: LineError,
    },

    /// Ingredient not found
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// Preparation type not found
    #[error("Preparation type not found: {0}")]
    PreparationTypeNotFound(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Recipe not found
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    /// Mealkit not found
    #[error("Mealkit not found: {0}")]
    MealkitNotFound(String),

    /// Currency mismatch between catalog entries
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No priced entries loaded yet
    #[error("No priced entries loaded yet; currency unknown")]
    NoCurrency,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Fixture key -> catalog entry
    ingredients: FxHashMap<String, Ingredient>,
    preparation_types: FxHashMap<String, PreparationType>,
    products: FxHashMap<String, Product>,
    recipes: FxHashMap<String, Recipe>,
    mealkits: FxHashMap<String, Mealkit>,

    /// Currency shared by every price in the fixture
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ingredients: FxHashMap::default(),
            preparation_types: FxHashMap::default(),
            products: FxHashMap::default(),
            recipes: FxHashMap::default(),
            mealkits: FxHashMap::default(),
            currency: None,
        }
    }

    /// Load a named catalog from `<base>/catalog/<name>.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if references between entries
    /// are broken, or if there are currency mismatches.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalog").join(format!("{name}.yml"));

        self.load_file(&file_path)
    }

    /// Load a catalog from any YAML file
    ///
    /// # Errors
    ///
    /// See [`Fixture::load_catalog`].
    pub fn load_file(&mut self, path: &Path) -> Result<&mut Self, FixtureError> {
        let contents = fs::read_to_string(path)?;
        let fixture: CatalogFixture = serde_norway::from_str(&contents)?;

        for (key, ingredient) in fixture.ingredients {
            let ingredient = Ingredient::try_from(ingredient)?;

            self.check_currency(ingredient.price().currency())?;
            self.ingredients.insert(key, ingredient);
        }

        for (key, preparation) in fixture.preparation_types {
            let preparation = PreparationType::try_from(preparation)?;

            self.check_currency(preparation.surcharge().currency())?;
            self.preparation_types.insert(key, preparation);
        }

        for (key, product) in fixture.products {
            let product = Product::try_from(product)?;

            self.check_currency(product.price().currency())?;
            self.products.insert(key, product);
        }

        for (key, recipe) in fixture.recipes {
            let recipe = self.build_recipe(&key, recipe)?;

            self.recipes.insert(key, recipe);
        }

        for (key, mealkit) in fixture.mealkits {
            let mealkit = self.build_mealkit(mealkit)?;

            self.check_currency(mealkit.price().currency())?;
            self.mealkits.insert(key, mealkit);
        }

        Ok(self)
    }

    /// Load a complete fixture set
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_catalog(name)?;

        Ok(fixture)
    }

    /// Load a fixture from a single YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(path.parent().unwrap_or(Path::new(".")));

        fixture.load_file(path)?;

        Ok(fixture)
    }

    /// Get an ingredient by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the ingredient is not found.
    pub fn ingredient(&self, key: &str) -> Result<&Ingredient, FixtureError> {
        self.ingredients
            .get(key)
            .ok_or_else(|| FixtureError::IngredientNotFound(key.to_string()))
    }

    /// Get a preparation type by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the preparation type is not found.
    pub fn preparation_type(&self, key: &str) -> Result<&PreparationType, FixtureError> {
        self.preparation_types
            .get(key)
            .ok_or_else(|| FixtureError::PreparationTypeNotFound(key.to_string()))
    }

    /// Get a product by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product, FixtureError> {
        self.products
            .get(key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a recipe by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the recipe is not found.
    pub fn recipe(&self, key: &str) -> Result<&Recipe, FixtureError> {
        self.recipes
            .get(key)
            .ok_or_else(|| FixtureError::RecipeNotFound(key.to_string()))
    }

    /// Get a mealkit by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the mealkit is not found.
    pub fn mealkit(&self, key: &str) -> Result<&Mealkit, FixtureError> {
        self.mealkits
            .get(key)
            .ok_or_else(|| FixtureError::MealkitNotFound(key.to_string()))
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if nothing priced has been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Build an id-indexed catalog from everything loaded
    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::new();

        self.ingredients
            .values()
            .cloned()
            .for_each(|ingredient| catalog.insert_ingredient(ingredient));

        self.preparation_types
            .values()
            .cloned()
            .for_each(|preparation| catalog.insert_preparation_type(preparation));

        self.products
            .values()
            .cloned()
            .for_each(|product| catalog.insert_product(product));

        self.recipes
            .values()
            .cloned()
            .for_each(|recipe| catalog.insert_recipe(recipe));

        self.mealkits
            .values()
            .cloned()
            .for_each(|mealkit| catalog.insert_mealkit(mealkit));

        catalog
    }

    fn check_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency);

                Ok(())
            }
        }
    }

    fn build_recipe(&self, key: &str, fixture: RecipeFixture) -> Result<Recipe, FixtureError> {
        let id = fixture.recipe_id();

        let selections = fixture
            .ingredients
            .into_iter()
            .map(|selection| -> Result<IngredientSelection, FixtureError> {
                let ingredient = self.ingredient(&selection.ingredient)?.clone();

                let quantity = Quantity::new(selection.quantity).map_err(|source| {
                    FixtureError::InvalidQuantity {
                        recipe: key.to_string(),
                        ingredient: selection.ingredient.clone(),
                        source,
                    }
                })?;

                Ok(match selection.preparation {
                    Some(preparation) => IngredientSelection::prepared(
                        ingredient,
                        self.preparation_type(&preparation)?.clone(),
                        quantity,
                    ),
                    None => IngredientSelection::plain(ingredient, quantity),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Recipe::new(id, fixture.name, selections)?)
    }

    fn build_mealkit(&self, fixture: MealkitFixture) -> Result<Mealkit, FixtureError> {
        let id = fixture.mealkit_id();
        let price = catalog::parse_price(&fixture.price)?;

        let recipes = fixture
            .recipes
            .iter()
            .map(|key| self.recipe(key).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Mealkit::new(id, fixture.name, recipes, price)?)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
