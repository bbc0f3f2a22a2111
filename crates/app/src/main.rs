//! Mealcart command line

use std::{io, path::Path, process};

use clap::{Parser, Subcommand};
use mealcart::{
    catalog::{Ingredient, IngredientSelection, PreparationType},
    fixtures::Fixture,
    lines::{LinePath, Quantity},
    mutations::{CartAction, NewLine},
};
use mealcart_app::{
    client::HttpCartService,
    config::{CartConfig, LoggingConfig, ServiceConfig},
    observability::init_logging,
    paths::parse_line_path,
    render::{write_cart, write_preparations, write_products},
    session::{CartSession, Dispatch, SessionError},
};
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "mealcart", about = "Compose and price a meal cart", long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceConfig,

    #[command(flatten)]
    cart: CartConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    /// Accept price changes from customizing a mealkit without asking
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the cart
    Show,

    /// List catalog products carrying a dietary tag
    Products {
        /// Dietary tag, e.g. `vegan`
        #[arg(long)]
        tag: String,
    },

    /// List the preparation types available for an ingredient
    Preparations {
        /// Ingredient catalog key
        ingredient: String,
    },

    /// Add a catalog product
    AddProduct {
        /// Catalog key
        key: String,

        /// Number of units
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Add a catalog recipe with its default ingredients
    AddRecipe {
        /// Catalog key
        key: String,

        /// Number of recipes
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Add a catalog mealkit
    AddMealkit {
        /// Catalog key
        key: String,

        /// Number of mealkits
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Add an ingredient to a recipe line
    AddIngredient {
        /// Recipe line, e.g. `recipe:2` or `recipe:5/6`
        #[arg(value_parser = parse_line_path)]
        recipe: LinePath,

        /// Ingredient catalog key
        ingredient: String,

        /// Preparation type catalog key
        #[arg(long)]
        preparation: Option<String>,

        /// Number of units
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Set a line's quantity
    SetQuantity {
        /// Line address
        #[arg(value_parser = parse_line_path)]
        line: LinePath,

        /// New quantity, at least one
        quantity: u32,
    },

    /// Add one to a line's quantity
    Increment {
        /// Line address
        #[arg(value_parser = parse_line_path)]
        line: LinePath,
    },

    /// Take one from a line's quantity, removing it at one
    Decrement {
        /// Line address
        #[arg(value_parser = parse_line_path)]
        line: LinePath,
    },

    /// Remove a line
    Remove {
        /// Line address
        #[arg(value_parser = parse_line_path)]
        line: LinePath,
    },

    /// Change or clear an ingredient's preparation type
    SetPreparation {
        /// Ingredient line, e.g. `ingredient:2/3`
        #[arg(value_parser = parse_line_path)]
        line: LinePath,

        /// Preparation type catalog key; omit to clear it
        preparation: Option<String>,
    },
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = init_logging(&cli.logging) {
        report(&error.to_string());
        process::exit(1);
    }

    if let Err(error) = run(cli).await {
        report(&error);
        process::exit(1);
    }
}

fn report(message: &str) {
    #[expect(
        clippy::print_stderr,
        reason = "command line errors are reported on stderr"
    )]
    {
        eprintln!("{message}");
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match &cli.command {
        Commands::Products { tag } => {
            let catalog = load_catalog(&cli.cart.catalog)?.catalog();

            return write_products(io::stdout().lock(), &catalog.products_tagged(tag))
                .map_err(|error| error.to_string());
        }
        Commands::Preparations { ingredient } => {
            let fixture = load_catalog(&cli.cart.catalog)?;
            let ingredient = fixture
                .ingredient(ingredient)
                .map_err(|error| error.to_string())?;

            return write_preparations(
                io::stdout().lock(),
                &fixture.catalog().preparation_types_for(ingredient),
            )
            .map_err(|error| error.to_string());
        }
        _ => {}
    }

    let currency = cli.cart.currency().map_err(|error| error.to_string())?;
    let service = HttpCartService::new(cli.service.api_url.clone(), cli.service.timeout())
        .map_err(|error| format!("failed to build cart service client: {error}"))?;

    let mut session = CartSession::new(service, currency, cli.cart.guard_scope.into());

    match cli.service.bearer_token() {
        Some(token) => session.login(token),
        None => warn!("no bearer token configured, cart edits are disabled"),
    }

    let Some(action) = action(cli.command, &cli.cart)? else {
        session.load().await.map_err(|error| describe(&error))?;

        return show(&session);
    };

    match session.sync(action).await.map_err(|error| describe(&error))? {
        Dispatch::Disabled => {
            return Err("Set MEALCART_TOKEN to edit the cart".to_string());
        }
        Dispatch::AwaitingConfirmation(pending) => {
            if !cli.yes {
                session.cancel();

                return Err(format!(
                    "Customizing mealkit line {} may change its price; rerun with --yes to continue",
                    pending.bundle()
                ));
            }

            session
                .confirm_and_sync()
                .await
                .map_err(|error| describe(&error))?;
        }
        Dispatch::Synced | Dispatch::Stale => {}
    }

    show(&session)
}

fn show(session: &CartSession<HttpCartService>) -> Result<(), String> {
    write_cart(io::stdout().lock(), session.cart()).map_err(|error| error.to_string())
}

fn describe(error: &SessionError) -> String {
    match error {
        SessionError::Sync(sync) => sync.user_message().to_string(),
        SessionError::Cart(_) | SessionError::Snapshot(_) => error.to_string(),
    }
}

fn action(command: Commands, config: &CartConfig) -> Result<Option<CartAction>, String> {
    let action = match command {
        Commands::Show | Commands::Products { .. } | Commands::Preparations { .. } => {
            return Ok(None);
        }
        Commands::AddProduct { key, quantity } => {
            let catalog = load_catalog(&config.catalog)?;

            CartAction::Add(NewLine::Product {
                product: catalog.product(&key).map_err(|error| error.to_string())?.clone(),
                quantity: quantity_arg(quantity)?,
            })
        }
        Commands::AddRecipe { key, quantity } => {
            let catalog = load_catalog(&config.catalog)?;
            let recipe = catalog.recipe(&key).map_err(|error| error.to_string())?;

            CartAction::Add(NewLine::recipe_with_defaults(
                recipe.clone(),
                quantity_arg(quantity)?,
            ))
        }
        Commands::AddMealkit { key, quantity } => {
            let catalog = load_catalog(&config.catalog)?;

            CartAction::Add(NewLine::Mealkit {
                mealkit: catalog.mealkit(&key).map_err(|error| error.to_string())?.clone(),
                quantity: quantity_arg(quantity)?,
            })
        }
        Commands::AddIngredient {
            recipe,
            ingredient,
            preparation,
            quantity,
        } => {
            let LinePath::Recipe(recipe) = recipe else {
                return Err(format!("{recipe} is not a recipe line"));
            };

            let catalog = load_catalog(&config.catalog)?;
            let ingredient = catalog
                .ingredient(&ingredient)
                .map_err(|error| error.to_string())?;

            let preparation = preparation
                .map(|key| applicable_preparation(&catalog, ingredient, &key))
                .transpose()?;

            CartAction::Add(NewLine::Ingredient {
                recipe,
                selection: IngredientSelection {
                    ingredient: ingredient.clone(),
                    preparation,
                    quantity: quantity_arg(quantity)?,
                },
            })
        }
        Commands::SetQuantity { line, quantity } => CartAction::SetQuantity(line, quantity),
        Commands::Increment { line } => CartAction::Increment(line),
        Commands::Decrement { line } => CartAction::Decrement(line),
        Commands::Remove { line } => CartAction::Remove(line),
        Commands::SetPreparation { line, preparation } => {
            let LinePath::Ingredient(path) = line else {
                return Err(format!("{line} is not an ingredient line"));
            };

            let preparation = match preparation {
                Some(key) => Some(
                    load_catalog(&config.catalog)?
                        .preparation_type(&key)
                        .map_err(|error| error.to_string())?
                        .clone(),
                ),
                None => None,
            };

            CartAction::SetPreparation(path, preparation)
        }
    };

    Ok(Some(action))
}

fn applicable_preparation(
    fixture: &Fixture,
    ingredient: &Ingredient,
    key: &str,
) -> Result<PreparationType, String> {
    let preparation = fixture
        .preparation_type(key)
        .map_err(|error| error.to_string())?;

    let catalog = fixture.catalog();
    let available = catalog.preparation_types_for(ingredient);

    if available.iter().any(|candidate| candidate.id() == preparation.id()) {
        return Ok(preparation.clone());
    }

    let names = available
        .iter()
        .map(|candidate| candidate.name())
        .collect::<Vec<_>>()
        .join(", ");

    Err(format!(
        "{} cannot be {}; available preparations: {}",
        ingredient.name(),
        preparation.name(),
        if names.is_empty() { "none" } else { names.as_str() }
    ))
}

fn load_catalog(path: &Path) -> Result<Fixture, String> {
    Fixture::from_path(path)
        .map_err(|error| format!("failed to load catalog {}: {error}", path.display()))
}

fn quantity_arg(quantity: u32) -> Result<Quantity, String> {
    Quantity::new(quantity).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use mealcart::lines::{LineId, RecipePath};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn command_line_parses_nested_addresses() -> TestResult {
        let cli = Cli::try_parse_from(["mealcart", "--yes", "increment", "ingredient:5/6/7"])?;

        assert!(cli.yes);
        assert!(matches!(
            cli.command,
            Commands::Increment {
                line: LinePath::Ingredient(path)
            } if path.recipe == RecipePath::InMealkit { mealkit: LineId(5), recipe: LineId(6) }
        ));

        Ok(())
    }

    #[test]
    fn set_preparation_requires_an_ingredient_line() -> TestResult {
        let cli = Cli::try_parse_from(["mealcart", "set-preparation", "product:1"])?;

        assert!(action(cli.command, &cli.cart).is_err());

        Ok(())
    }

    #[test]
    fn add_ingredient_rejects_preparation_of_another_category() -> TestResult {
        let cli = Cli::try_parse_from([
            "mealcart",
            "--catalog",
            "../core/fixtures/catalog/weeknight.yml",
            "add-ingredient",
            "recipe:2",
            "chicken",
            "--preparation",
            "steamed",
        ])?;

        let Err(message) = action(cli.command, &cli.cart) else {
            return Err("steamed chicken should be rejected".into());
        };

        assert_eq!(
            message,
            "Chicken breast cannot be Steamed; available preparations: Grilled"
        );

        Ok(())
    }

    #[test]
    fn add_ingredient_accepts_listed_preparation() -> TestResult {
        let cli = Cli::try_parse_from([
            "mealcart",
            "--catalog",
            "../core/fixtures/catalog/weeknight.yml",
            "add-ingredient",
            "recipe:2",
            "chicken",
            "--preparation",
            "grilled",
        ])?;

        let Some(CartAction::Add(NewLine::Ingredient { selection, .. })) =
            action(cli.command, &cli.cart)?
        else {
            return Err("expected an ingredient".into());
        };

        assert_eq!(
            selection.preparation.as_ref().map(PreparationType::name),
            Some("Grilled")
        );

        Ok(())
    }

    #[test]
    fn add_product_resolves_catalog_key() -> TestResult {
        let cli = Cli::try_parse_from([
            "mealcart",
            "--catalog",
            "../core/fixtures/catalog/weeknight.yml",
            "add-product",
            "oat_milk",
            "--quantity",
            "2",
        ])?;

        let Some(CartAction::Add(NewLine::Product { product, quantity })) =
            action(cli.command, &cli.cart)?
        else {
            return Err("expected a product".into());
        };

        assert_eq!(product.name(), "Oat milk");
        assert_eq!(quantity.get(), 2);

        Ok(())
    }
}
