//! Mealcart
//!
//! Mealcart is the cart composition and pricing engine behind a food-ordering client. It models
//! a cart holding standalone products, standalone recipes (built from ingredients with optional
//! preparation types) and mealkits (built from recipes), keeps every total consistent from the
//! bottom up, and gates the first customization of a priced bundle behind a confirmation.

pub mod cart;
pub mod catalog;
pub mod editor;
pub mod fixtures;
pub mod guard;
pub mod lines;
pub mod mutations;
pub mod prelude;
pub mod pricing;
