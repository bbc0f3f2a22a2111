//! Cart table

use std::io;

use mealcart::{
    cart::{Cart, CartError},
    catalog::{PreparationType, Product},
    lines::{IngredientLine, IngredientPath, LineError, LinePath, RecipeLine, RecipePath},
};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::paths::format_line_path;

/// Errors rendering a cart.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A line could not be priced.
    #[error(transparent)]
    Line(#[from] LineError),

    /// The cart totals could not be computed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Writing the output failed.
    #[error("IO error")]
    IO,
}

/// Writes the cart as a table followed by its totals.
///
/// # Errors
///
/// Returns a [`RenderError`] if a line cannot be priced or the output cannot be written.
pub fn write_cart(mut out: impl io::Write, cart: &Cart) -> Result<(), RenderError> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty").map_err(|_err| RenderError::IO);
    }

    let mut builder = Builder::default();

    builder.push_record(["Line", "Item", "Detail", "Qty", "Unit", "Total"]);

    for line in cart.products() {
        builder.push_record([
            format_line_path(LinePath::Product(line.id())),
            line.product().name().to_string(),
            line.product().tags().join(", "),
            line.quantity().to_string(),
            line.product().price().to_string(),
            line.total_price().to_string(),
        ]);
    }

    for line in cart.recipes() {
        push_recipe(&mut builder, RecipePath::Standalone(line.id()), line, 0)?;
    }

    for line in cart.mealkits() {
        builder.push_record([
            format_line_path(LinePath::Mealkit(line.id())),
            line.name().to_string(),
            String::new(),
            line.quantity().to_string(),
            line.unit_price().to_string(),
            line.total_price().to_string(),
        ]);

        for recipe in line.recipes() {
            let path = RecipePath::InMealkit {
                mealkit: line.id(),
                recipe: recipe.id(),
            };

            push_recipe(&mut builder, path, recipe, 1)?;
        }
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..6), Alignment::right());

    let totals = cart.totals()?;

    writeln!(out, "{table}").map_err(|_err| RenderError::IO)?;
    writeln!(out, " Items: {}", totals.total_item).map_err(|_err| RenderError::IO)?;
    writeln!(out, " Total: {}", totals.total_price).map_err(|_err| RenderError::IO)
}

/// Writes catalog products as a table.
///
/// # Errors
///
/// Returns [`RenderError::IO`] if the output cannot be written.
pub fn write_products(mut out: impl io::Write, products: &[&Product]) -> Result<(), RenderError> {
    if products.is_empty() {
        return writeln!(out, "No matching products").map_err(|_err| RenderError::IO);
    }

    let mut builder = Builder::default();

    builder.push_record(["Id", "Product", "Tags", "Price"]);

    for product in products {
        builder.push_record([
            product.id().to_string(),
            product.name().to_string(),
            product.tags().join(", "),
            product.price().to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..4), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| RenderError::IO)
}

/// Writes the preparation types available for an ingredient.
///
/// # Errors
///
/// Returns [`RenderError::IO`] if the output cannot be written.
pub fn write_preparations(
    mut out: impl io::Write,
    preparations: &[&PreparationType],
) -> Result<(), RenderError> {
    if preparations.is_empty() {
        return writeln!(out, "No preparation types").map_err(|_err| RenderError::IO);
    }

    let mut builder = Builder::default();

    builder.push_record(["Id", "Preparation", "Surcharge"]);

    for preparation in preparations {
        builder.push_record([
            preparation.id().to_string(),
            preparation.name().to_string(),
            preparation.surcharge().to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..3), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| RenderError::IO)
}

fn push_recipe(
    builder: &mut Builder,
    path: RecipePath,
    line: &RecipeLine,
    depth: usize,
) -> Result<(), RenderError> {
    builder.push_record([
        format_line_path(LinePath::Recipe(path)),
        format!("{}{}", indent(depth), line.name()),
        String::new(),
        line.quantity().to_string(),
        String::new(),
        line.total_price().to_string(),
    ]);

    for ingredient in line.ingredients() {
        push_ingredient(builder, path, ingredient, depth + 1)?;
    }

    Ok(())
}

fn push_ingredient(
    builder: &mut Builder,
    recipe: RecipePath,
    line: &IngredientLine,
    depth: usize,
) -> Result<(), RenderError> {
    let path = LinePath::Ingredient(IngredientPath {
        recipe,
        ingredient: line.id(),
    });

    builder.push_record([
        format_line_path(path),
        format!("{}{}", indent(depth), line.ingredient().name()),
        line.preparation()
            .map(|preparation| preparation.name().to_string())
            .unwrap_or_default(),
        line.quantity().to_string(),
        line.unit_price()?.to_string(),
        line.price().to_string(),
    ]);

    Ok(())
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
