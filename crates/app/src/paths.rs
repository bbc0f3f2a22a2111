//! Line addresses
//!
//! Lines are addressed on the command line as `<type>:<ids>`, where nested lines list their
//! ancestors first: `product:1`, `mealkit:5`, `recipe:2`, `recipe:5/6`, `ingredient:2/3`,
//! `ingredient:5/6/7`.

use std::num::ParseIntError;

use mealcart::lines::{IngredientPath, LineId, LinePath, RecipePath};
use thiserror::Error;

/// Errors parsing a line address.
#[derive(Debug, Error, PartialEq)]
pub enum LinePathError {
    /// The address has no `<type>:` prefix.
    #[error("expected <type>:<ids>, got {0:?}")]
    Malformed(String),

    /// The type is not a line type.
    #[error("unknown line type {0:?}")]
    UnknownType(String),

    /// An identifier is not a number.
    #[error("invalid line id: {0}")]
    InvalidId(#[from] ParseIntError),

    /// Too many or too few identifiers for the type.
    #[error("{kind} addresses take {expected} ids, got {found}")]
    WrongArity {
        /// Line type
        kind: &'static str,
        /// Accepted id counts
        expected: &'static str,
        /// Ids given
        found: usize,
    },
}

/// Parses a line address.
///
/// # Errors
///
/// Returns a [`LinePathError`] if the address is malformed.
pub fn parse_line_path(address: &str) -> Result<LinePath, LinePathError> {
    let (kind, ids) = address
        .trim()
        .split_once(':')
        .ok_or_else(|| LinePathError::Malformed(address.to_string()))?;

    let ids = ids
        .split('/')
        .map(|id| id.trim().parse().map(LineId))
        .collect::<Result<Vec<_>, _>>()?;

    let path = match (kind.trim().to_ascii_lowercase().as_str(), ids.as_slice()) {
        ("product", [id]) => LinePath::Product(*id),
        ("mealkit", [id]) => LinePath::Mealkit(*id),
        ("recipe", [id]) => LinePath::Recipe(RecipePath::Standalone(*id)),
        ("recipe", [mealkit, recipe]) => LinePath::Recipe(RecipePath::InMealkit {
            mealkit: *mealkit,
            recipe: *recipe,
        }),
        ("ingredient", [recipe, ingredient]) => LinePath::Ingredient(IngredientPath {
            recipe: RecipePath::Standalone(*recipe),
            ingredient: *ingredient,
        }),
        ("ingredient", [mealkit, recipe, ingredient]) => LinePath::Ingredient(IngredientPath {
            recipe: RecipePath::InMealkit {
                mealkit: *mealkit,
                recipe: *recipe,
            },
            ingredient: *ingredient,
        }),
        ("product", ids) => return Err(arity("product", "1", ids.len())),
        ("mealkit", ids) => return Err(arity("mealkit", "1", ids.len())),
        ("recipe", ids) => return Err(arity("recipe", "1 or 2", ids.len())),
        ("ingredient", ids) => return Err(arity("ingredient", "2 or 3", ids.len())),
        (other, _) => return Err(LinePathError::UnknownType(other.to_string())),
    };

    Ok(path)
}

fn arity(kind: &'static str, expected: &'static str, found: usize) -> LinePathError {
    LinePathError::WrongArity {
        kind,
        expected,
        found,
    }
}

/// Formats a line address accepted by [`parse_line_path`].
pub fn format_line_path(path: LinePath) -> String {
    match path {
        LinePath::Product(id) => format!("product:{id}"),
        LinePath::Mealkit(id) => format!("mealkit:{id}"),
        LinePath::Recipe(recipe) => format!("recipe:{}", recipe_ids(recipe)),
        LinePath::Ingredient(IngredientPath { recipe, ingredient }) => {
            format!("ingredient:{}/{ingredient}", recipe_ids(recipe))
        }
    }
}

fn recipe_ids(path: RecipePath) -> String {
    match path {
        RecipePath::Standalone(id) => id.to_string(),
        RecipePath::InMealkit { mealkit, recipe } => format!("{mealkit}/{recipe}"),
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn nested_addresses_list_ancestors_first() -> TestResult {
        let path = parse_line_path("ingredient:5/6/7")?;

        assert_eq!(
            path,
            LinePath::Ingredient(IngredientPath {
                recipe: RecipePath::InMealkit {
                    mealkit: LineId(5),
                    recipe: LineId(6),
                },
                ingredient: LineId(7),
            })
        );
        assert_eq!(format_line_path(path), "ingredient:5/6/7");

        Ok(())
    }

    #[test]
    fn formatted_addresses_parse_back() -> TestResult {
        for address in ["product:1", "mealkit:5", "recipe:2", "recipe:5/6", "ingredient:2/3"] {
            assert_eq!(format_line_path(parse_line_path(address)?), address);
        }

        Ok(())
    }

    #[test]
    fn bad_addresses_are_rejected() {
        assert!(matches!(
            parse_line_path("product"),
            Err(LinePathError::Malformed(_))
        ));
        assert!(matches!(
            parse_line_path("basket:1"),
            Err(LinePathError::UnknownType(_))
        ));
        assert!(matches!(
            parse_line_path("recipe:x"),
            Err(LinePathError::InvalidId(_))
        ));
        assert_eq!(
            parse_line_path("mealkit:1/2"),
            Err(LinePathError::WrongArity {
                kind: "mealkit",
                expected: "1",
                found: 2,
            })
        );
    }
}
