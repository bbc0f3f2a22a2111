//! Mutations
//!
//! [`CartAction`] is what a caller asks for (e.g. "decrement this line"); [`Mutation`] is the
//! concrete change the cart resolved it into (e.g. "remove this line"). Mutations are plain
//! data so they can be held while awaiting confirmation, logged, and replayed.

use crate::{
    catalog::{IngredientSelection, Mealkit, PreparationType, Product, Recipe},
    lines::{IngredientPath, ItemType, LineId, LinePath, Quantity, RecipePath},
};

/// A line to append to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum NewLine {
    /// Standalone product
    Product {
        /// Catalog product
        product: Product,
        /// Number of units
        quantity: Quantity,
    },

    /// Standalone recipe with explicit ingredient selections
    Recipe {
        /// Catalog recipe
        recipe: Recipe,
        /// Ingredient selections, in display order
        selections: Vec<IngredientSelection>,
        /// Number of recipes
        quantity: Quantity,
    },

    /// Mealkit with its default recipe composition
    Mealkit {
        /// Catalog mealkit
        mealkit: Mealkit,
        /// Number of mealkits
        quantity: Quantity,
    },

    /// Extra ingredient inside an existing recipe line
    Ingredient {
        /// Recipe line receiving the ingredient
        recipe: RecipePath,
        /// Ingredient selection
        selection: IngredientSelection,
    },
}

impl NewLine {
    /// Standalone recipe using the recipe's default selections.
    pub fn recipe_with_defaults(recipe: Recipe, quantity: Quantity) -> Self {
        let selections = recipe.ingredients().to_vec();

        Self::Recipe {
            recipe,
            selections,
            quantity,
        }
    }

    /// Kind of line created
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Product { .. } => ItemType::Product,
            Self::Recipe { .. } => ItemType::Recipe,
            Self::Mealkit { .. } => ItemType::Mealkit,
            Self::Ingredient { .. } => ItemType::Ingredient,
        }
    }

    /// Mealkit line the new line is nested in, if any
    pub fn bundle(&self) -> Option<LineId> {
        match self {
            Self::Ingredient { recipe, .. } => recipe.bundle(),
            Self::Product { .. } | Self::Recipe { .. } | Self::Mealkit { .. } => None,
        }
    }
}

/// A caller's intent, before it is resolved against the current cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Append a new line
    Add(NewLine),

    /// Raise a line's quantity by one
    Increment(LinePath),

    /// Lower a line's quantity by one, removing it at one
    Decrement(LinePath),

    /// Set a line's quantity; zero is rejected rather than treated as removal
    SetQuantity(LinePath, u32),

    /// Remove a line
    Remove(LinePath),

    /// Change (or clear) an ingredient's preparation type
    SetPreparation(IngredientPath, Option<PreparationType>),
}

/// A concrete change to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Append a new line
    Add(NewLine),

    /// Set a line's quantity
    SetQuantity {
        /// Line to update
        target: LinePath,
        /// New quantity
        quantity: Quantity,
    },

    /// Remove a line
    Remove {
        /// Line to remove
        target: LinePath,
    },

    /// Change an ingredient's preparation type
    SetPreparation {
        /// Ingredient line to update
        target: IngredientPath,
        /// New preparation type, or `None` to clear it
        preparation: Option<PreparationType>,
    },
}

impl Mutation {
    /// Kind of entity the mutation targets
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Add(line) => line.item_type(),
            Self::SetQuantity { target, .. } | Self::Remove { target } => target.item_type(),
            Self::SetPreparation { .. } => ItemType::Ingredient,
        }
    }

    /// Mealkit line whose composition this mutation changes, if any.
    ///
    /// Changes to a mealkit line's own quantity do not customize the bundle and return `None`.
    pub fn bundle(&self) -> Option<LineId> {
        match self {
            Self::Add(line) => line.bundle(),
            Self::SetQuantity { target, .. } | Self::Remove { target } => target.bundle(),
            Self::SetPreparation { target, .. } => target.recipe.bundle(),
        }
    }

    /// Path of the existing line this mutation touches, if any
    pub fn target(&self) -> Option<LinePath> {
        match self {
            Self::Add(_) => None,
            Self::SetQuantity { target, .. } | Self::Remove { target } => Some(*target),
            Self::SetPreparation { target, .. } => Some(LinePath::Ingredient(*target)),
        }
    }
}
