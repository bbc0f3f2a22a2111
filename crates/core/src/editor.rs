//! Cart Editor
//!
//! Runs mutations through the customization guard before they reach the cart.

use crate::{
    cart::{Cart, CartError},
    guard::{CustomizationGuard, GuardDecision, GuardScope, GuardState, PendingCommand},
    lines::LineId,
    mutations::{CartAction, Mutation},
};

/// Result of submitting a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The mutation was applied to the cart
    Applied {
        /// Applied mutation
        mutation: Mutation,
        /// New line, for additions
        line: Option<LineId>,
    },

    /// The mutation needs confirmation and was not applied
    Suspended(PendingCommand),
}

/// A cart together with its customization guard.
#[derive(Debug, Clone)]
pub struct CartEditor {
    cart: Cart,
    guard: CustomizationGuard,
}

impl CartEditor {
    /// Creates an editor over a cart with every bundle untouched.
    pub fn new(cart: Cart, scope: GuardScope) -> Self {
        Self {
            cart,
            guard: CustomizationGuard::new(scope),
        }
    }

    /// Current cart
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Customization guard
    pub fn guard(&self) -> &CustomizationGuard {
        &self.guard
    }

    /// Guard state of a mealkit line.
    pub fn guard_state(&self, bundle: LineId) -> GuardState {
        self.guard.state(bundle)
    }

    /// The command awaiting confirmation, if any
    pub fn pending(&self) -> Option<&PendingCommand> {
        self.guard.pending()
    }

    /// Resolves an action against the cart, then applies or suspends it.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the action is invalid for the current cart. Nothing is
    /// applied or suspended in that case.
    pub fn submit(&mut self, action: CartAction) -> Result<EditOutcome, CartError> {
        let mutation = self.cart.resolve(action)?;

        self.gate(mutation)
    }

    /// Validates a mutation, then applies or suspends it.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the mutation is invalid for the current cart.
    pub fn perform(&mut self, mutation: Mutation) -> Result<EditOutcome, CartError> {
        self.cart.validate(&mutation)?;

        self.gate(mutation)
    }

    /// Applies the pending command and marks its bundle as customized.
    ///
    /// Returns `None` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the command no longer applies. The command is dropped, the
    /// cart is unchanged, and the bundle stays untouched.
    pub fn confirm(&mut self) -> Result<Option<EditOutcome>, CartError> {
        let Some(pending) = self.guard.take_pending() else {
            return Ok(None);
        };

        let (bundle, mutation) = pending.into_parts();
        let line = self.cart.apply(&mutation)?;

        self.guard.mark_customized(bundle);

        Ok(Some(EditOutcome::Applied { mutation, line }))
    }

    /// Discards the pending command.
    pub fn cancel(&mut self) -> Option<PendingCommand> {
        self.guard.cancel()
    }

    /// Replaces the cart, e.g. with a server snapshot, keeping guard state for mealkit lines
    /// that still exist.
    pub fn replace_cart(&mut self, cart: Cart) {
        self.cart = cart;

        let cart = &self.cart;

        self.guard.retain_bundles(|bundle| cart.mealkit(bundle).is_some());
    }

    /// Empties the cart and resets the guard.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.guard.reset();
    }

    fn gate(&mut self, mutation: Mutation) -> Result<EditOutcome, CartError> {
        match self.guard.check(mutation) {
            GuardDecision::Proceed(mutation) => {
                let line = self.cart.apply(&mutation)?;

                Ok(EditOutcome::Applied { mutation, line })
            }
            GuardDecision::Suspend(pending) => Ok(EditOutcome::Suspended(pending)),
        }
    }
}
