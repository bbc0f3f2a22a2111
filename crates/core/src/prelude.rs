//! Mealcart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartTotals},
    catalog::{
        Catalog, CatalogError, DietaryTags, Ingredient, IngredientCategory, IngredientId,
        IngredientSelection, Mealkit, MealkitId, PreparationType, PreparationTypeId, Product,
        ProductId, Recipe, RecipeId,
    },
    editor::{CartEditor, EditOutcome},
    fixtures::{Fixture, FixtureError},
    guard::{CustomizationGuard, GuardDecision, GuardScope, GuardState, PendingCommand},
    lines::{
        IngredientLine, IngredientPath, ItemType, LineError, LineId, LinePath, MealkitLine,
        ProductLine, Quantity, RecipeLine, RecipePath, RecipePricing,
    },
    mutations::{CartAction, Mutation, NewLine},
    pricing::{
        PricingError, adjusted_unit_price, line_total, money_from_decimal, parse_currency,
        resolve_price, total_price,
    },
};
