//! Cart Lines
//!
//! The nested line model: ingredient lines belong to recipe lines, recipe lines either stand
//! alone or belong to a mealkit line, and product lines have no children. Totals are cached on
//! each line and recomputed strictly bottom-up.

use std::{fmt, num::NonZeroU32};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::PricingError;

mod ingredient;
mod mealkit;
mod product;
mod recipe;

pub use ingredient::IngredientLine;
pub use mealkit::MealkitLine;
pub use product::ProductLine;
pub use recipe::{RecipeLine, RecipePricing};

/// Errors raised while building or mutating lines.
#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    /// Lines must have a quantity of at least one.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// Incrementing a quantity overflowed.
    #[error("quantity cannot exceed {}", u32::MAX)]
    QuantityOverflow,

    /// A display name was empty.
    #[error("{0} line name cannot be empty")]
    EmptyName(&'static str),

    /// A recipe line priced on its own was placed inside a mealkit, or vice versa.
    #[error("recipe line {0} has the wrong pricing for its position in the cart")]
    MisplacedRecipe(LineId),

    /// Price resolution or aggregation failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Line quantity, always at least one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Creates a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::InvalidQuantity`] for zero.
    pub fn new(quantity: u32) -> Result<Self, LineError> {
        NonZeroU32::new(quantity)
            .map(Self)
            .ok_or(LineError::InvalidQuantity(quantity))
    }

    /// Quantity as a plain integer
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The next quantity up.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::QuantityOverflow`] at `u32::MAX`.
    pub fn incremented(self) -> Result<Self, LineError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(LineError::QuantityOverflow)
    }

    /// The next quantity down, or `None` when the line should be removed instead.
    pub fn decremented(self) -> Option<Self> {
        NonZeroU32::new(self.0.get() - 1).map(Self)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = LineError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a line in the cart.
///
/// Server snapshots carry server-assigned identifiers; lines added optimistically get a local
/// identifier until the next snapshot replaces them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of entity a line or mutation targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Catalog product
    Product,

    /// Recipe, standalone or inside a mealkit
    Recipe,

    /// Mealkit bundle
    Mealkit,

    /// Ingredient inside a recipe
    Ingredient,
}

impl ItemType {
    /// Wire name of the item type
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Recipe => "recipe",
            Self::Mealkit => "mealkit",
            Self::Ingredient => "ingredient",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a recipe line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecipePath {
    /// A recipe added to the cart on its own
    Standalone(LineId),

    /// A recipe owned by a mealkit line
    InMealkit {
        /// Owning mealkit line
        mealkit: LineId,
        /// Recipe line within the mealkit
        recipe: LineId,
    },
}

impl RecipePath {
    /// Identifier of the recipe line itself
    pub fn line_id(self) -> LineId {
        match self {
            Self::Standalone(id) | Self::InMealkit { recipe: id, .. } => id,
        }
    }

    /// Owning mealkit line, if any
    pub fn bundle(self) -> Option<LineId> {
        match self {
            Self::Standalone(_) => None,
            Self::InMealkit { mealkit, .. } => Some(mealkit),
        }
    }
}

impl fmt::Display for RecipePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standalone(id) => write!(f, "recipe {id}"),
            Self::InMealkit { mealkit, recipe } => write!(f, "mealkit {mealkit} / recipe {recipe}"),
        }
    }
}

/// Location of an ingredient line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IngredientPath {
    /// Owning recipe line
    pub recipe: RecipePath,

    /// Ingredient line within the recipe
    pub ingredient: LineId,
}

impl fmt::Display for IngredientPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / ingredient {}", self.recipe, self.ingredient)
    }
}

/// Location of any line in the cart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LinePath {
    /// Top-level product line
    Product(LineId),

    /// Recipe line, standalone or nested
    Recipe(RecipePath),

    /// Top-level mealkit line
    Mealkit(LineId),

    /// Ingredient line within a recipe
    Ingredient(IngredientPath),
}

impl LinePath {
    /// Kind of line addressed
    pub fn item_type(self) -> ItemType {
        match self {
            Self::Product(_) => ItemType::Product,
            Self::Recipe(_) => ItemType::Recipe,
            Self::Mealkit(_) => ItemType::Mealkit,
            Self::Ingredient(_) => ItemType::Ingredient,
        }
    }

    /// Identifier of the addressed line
    pub fn line_id(self) -> LineId {
        match self {
            Self::Product(id) | Self::Mealkit(id) => id,
            Self::Recipe(recipe) => recipe.line_id(),
            Self::Ingredient(path) => path.ingredient,
        }
    }

    /// Mealkit line this path is nested in, if any.
    ///
    /// A mealkit line's own path is not nested, so it returns `None`.
    pub fn bundle(self) -> Option<LineId> {
        match self {
            Self::Product(_) | Self::Mealkit(_) => None,
            Self::Recipe(recipe) => recipe.bundle(),
            Self::Ingredient(path) => path.recipe.bundle(),
        }
    }
}

impl fmt::Display for LinePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(id) => write!(f, "product {id}"),
            Self::Recipe(recipe) => recipe.fmt(f),
            Self::Mealkit(id) => write!(f, "mealkit {id}"),
            Self::Ingredient(path) => path.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn zero_quantity_is_rejected() {
        assert_eq!(Quantity::new(0), Err(LineError::InvalidQuantity(0)));
    }

    #[test]
    fn decrementing_one_yields_none() -> TestResult {
        assert_eq!(Quantity::ONE.decremented(), None);
        assert_eq!(Quantity::new(3)?.decremented(), Some(Quantity::new(2)?));

        Ok(())
    }

    #[test]
    fn incrementing_max_overflows() -> TestResult {
        assert_eq!(
            Quantity::new(u32::MAX)?.incremented(),
            Err(LineError::QuantityOverflow)
        );

        Ok(())
    }

    #[test]
    fn nested_paths_report_their_bundle() {
        let recipe = RecipePath::InMealkit {
            mealkit: LineId(4),
            recipe: LineId(9),
        };
        let ingredient = LinePath::Ingredient(IngredientPath {
            recipe,
            ingredient: LineId(12),
        });

        assert_eq!(ingredient.bundle(), Some(LineId(4)));
        assert_eq!(ingredient.line_id(), LineId(12));
        assert_eq!(ingredient.item_type(), ItemType::Ingredient);
        assert_eq!(LinePath::Mealkit(LineId(4)).bundle(), None);
        assert_eq!(LinePath::Recipe(RecipePath::Standalone(LineId(9))).bundle(), None);
        assert_eq!(
            ingredient.to_string(),
            "mealkit 4 / recipe 9 / ingredient 12"
        );
    }
}
