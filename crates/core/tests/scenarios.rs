//! End-to-end cart scenarios

use mealcart::{
    cart::{Cart, CartError},
    catalog::IngredientSelection,
    editor::{CartEditor, EditOutcome},
    fixtures::Fixture,
    guard::{GuardScope, GuardState},
    lines::{IngredientLine, IngredientPath, LineId, LinePath, Quantity, RecipeLine, RecipePath},
    mutations::{CartAction, NewLine},
};
use rusty_money::{Money, iso::USD};
use testresult::TestResult;

#[test]
fn plain_ingredient_line_price() -> TestResult {
    let fixture = Fixture::from_set("weeknight")?;
    let chicken = fixture.ingredient("chicken")?.clone();

    let line = IngredientLine::new(LineId(1), chicken, None, 2)?;

    assert_eq!(line.price(), Money::from_minor(10_00, USD));

    Ok(())
}

#[test]
fn prepared_ingredient_line_price() -> TestResult {
    let fixture = Fixture::from_set("weeknight")?;
    let chicken = fixture.ingredient("chicken")?.clone();
    let grilled = fixture.preparation_type("grilled")?.clone();

    let line = IngredientLine::new(LineId(1), chicken, Some(grilled), 2)?;

    assert_eq!(line.price(), Money::from_minor(13_00, USD));

    Ok(())
}

#[test]
fn recipe_line_sums_its_ingredients() -> TestResult {
    let fixture = Fixture::from_set("weeknight")?;
    let chicken = fixture.ingredient("chicken")?.clone();
    let grilled = fixture.preparation_type("grilled")?.clone();
    let recipe = fixture.recipe("chicken_bowl")?;

    let line = RecipeLine::standalone(
        LineId(1),
        recipe.id(),
        recipe.name(),
        vec![
            IngredientLine::new(LineId(2), chicken.clone(), None, 2)?,
            IngredientLine::new(LineId(3), chicken, Some(grilled), 2)?,
        ],
        1,
        USD,
    )?;

    assert_eq!(line.total_price(), Money::from_minor(23_00, USD));

    Ok(())
}

#[test]
fn decrementing_last_product_unit_removes_line() -> TestResult {
    let fixture = Fixture::from_set("weeknight")?;
    let mut cart = Cart::new(USD);

    cart.add_product(fixture.product("oat_milk")?.clone(), 3)?;

    let sourdough = cart.add_product(fixture.product("sourdough")?.clone(), 1)?;
    let before = cart.totals()?;

    cart.decrement(LinePath::Product(sourdough))?;

    let after = cart.totals()?;

    assert!(cart.product(sourdough).is_none());
    assert_eq!(after.total_item, before.total_item - 1);
    assert_eq!(
        after.total_price.to_minor_units(),
        before.total_price.to_minor_units() - 4_25
    );

    Ok(())
}

#[test]
fn first_nested_increment_waits_then_recomputes_ancestors() -> TestResult {
    let fixture = Fixture::from_set("weeknight")?;
    let mut cart = Cart::new(USD);
    let bundle = cart.add_mealkit(fixture.mealkit("weeknight_box")?, 1)?;
    let mut editor = CartEditor::new(cart, GuardScope::Bundle);

    let mealkit = editor.cart().mealkit(bundle).ok_or("mealkit missing")?;

    assert_eq!(mealkit.total_price(), Money::from_minor(29_99, USD));

    let recipe = mealkit.recipes().first().ok_or("no nested recipe")?;
    let ingredient = recipe.ingredients().first().ok_or("no ingredient")?;
    let path = IngredientPath {
        recipe: RecipePath::InMealkit {
            mealkit: bundle,
            recipe: recipe.id(),
        },
        ingredient: ingredient.id(),
    };
    let before = editor.cart().clone();

    let outcome = editor.submit(CartAction::Increment(LinePath::Ingredient(path)))?;

    assert!(matches!(outcome, EditOutcome::Suspended(_)));
    assert_eq!(editor.guard_state(bundle), GuardState::PendingConfirmation);
    assert_eq!(editor.cart(), &before);

    editor.confirm()?;

    let cart = editor.cart();
    let ingredient = cart.ingredient(path).ok_or("ingredient missing")?;
    let recipe = cart.recipe(path.recipe).ok_or("recipe missing")?;
    let mealkit = cart.mealkit(bundle).ok_or("mealkit missing")?;

    assert_eq!(ingredient.quantity(), Quantity::new(3)?);
    assert_eq!(ingredient.price(), Money::from_minor(15_00, USD));
    assert_eq!(recipe.total_price(), Money::from_minor(28_00, USD));
    assert_eq!(mealkit.total_price(), Money::from_minor(34_99, USD));
    assert_eq!(cart.totals()?.total_price, Money::from_minor(34_99, USD));
    assert_eq!(editor.guard_state(bundle), GuardState::Customized);

    Ok(())
}

#[test]
fn zero_quantity_update_is_rejected_without_change() -> TestResult {
    let fixture = Fixture::from_set("weeknight")?;
    let mut cart = Cart::new(USD);
    let bowl = fixture.recipe("chicken_bowl")?;
    let recipe = cart.add_recipe(bowl, bowl.ingredients().to_vec(), 2)?;
    let before = cart.clone();

    let result = cart.update_quantity(LinePath::Recipe(RecipePath::Standalone(recipe)), 0);

    assert_eq!(result, Err(CartError::InvalidQuantity(0)));
    assert_eq!(cart, before);

    Ok(())
}

#[test]
fn cancelled_customization_leaves_cart_alone() -> TestResult {
    let fixture = Fixture::from_set("weeknight")?;
    let mut cart = Cart::new(USD);
    let bundle = cart.add_mealkit(fixture.mealkit("weeknight_box")?, 1)?;
    let recipe = cart
        .mealkit(bundle)
        .and_then(|line| line.recipes().first())
        .map(RecipeLine::id)
        .ok_or("no nested recipe")?;
    let mut editor = CartEditor::new(cart, GuardScope::Bundle);
    let before = editor.cart().clone();

    editor.submit(CartAction::Add(NewLine::Ingredient {
        recipe: RecipePath::InMealkit {
            mealkit: bundle,
            recipe,
        },
        selection: IngredientSelection::plain(fixture.ingredient("rice")?.clone(), Quantity::ONE),
    }))?;

    let cancelled = editor.cancel().ok_or("nothing was pending")?;

    assert_eq!(cancelled.bundle(), bundle);
    assert_eq!(editor.cart(), &before);
    assert_eq!(editor.guard_state(bundle), GuardState::Untouched);

    Ok(())
}
