//! Customization Guard
//!
//! The first edit to a mealkit's nested composition needs explicit confirmation. Until the
//! caller confirms, the edit is held as a [`PendingCommand`] and the cart is not touched.

use rustc_hash::FxHashSet;

use crate::{lines::LineId, mutations::Mutation};

/// How widely a confirmation applies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GuardScope {
    /// One confirmation per mealkit line
    #[default]
    Bundle,

    /// One confirmation for the whole session
    Session,
}

/// Guard state of one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Not customized yet; the next nested edit needs confirmation
    Untouched,

    /// A nested edit is waiting for confirmation
    PendingConfirmation,

    /// Customization confirmed; nested edits apply immediately
    Customized,
}

/// A suspended mutation awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    bundle: LineId,
    mutation: Mutation,
}

impl PendingCommand {
    /// Mealkit line the mutation customizes
    pub fn bundle(&self) -> LineId {
        self.bundle
    }

    /// Suspended mutation
    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    /// Splits the command into its bundle and mutation.
    pub fn into_parts(self) -> (LineId, Mutation) {
        (self.bundle, self.mutation)
    }
}

/// Outcome of checking a mutation against the guard.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// Apply the mutation now
    Proceed(Mutation),

    /// The mutation was suspended and is now the pending command
    Suspend(PendingCommand),
}

/// Customization guard
#[derive(Debug, Default, Clone)]
pub struct CustomizationGuard {
    scope: GuardScope,
    customized: FxHashSet<LineId>,
    session_customized: bool,
    pending: Option<PendingCommand>,
}

impl CustomizationGuard {
    /// Creates a guard with every bundle untouched.
    pub fn new(scope: GuardScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Confirmation scope
    pub fn scope(&self) -> GuardScope {
        self.scope
    }

    /// Current state of a bundle.
    pub fn state(&self, bundle: LineId) -> GuardState {
        if self.is_customized(bundle) {
            GuardState::Customized
        } else if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.bundle == bundle)
        {
            GuardState::PendingConfirmation
        } else {
            GuardState::Untouched
        }
    }

    /// The command awaiting confirmation, if any
    pub fn pending(&self) -> Option<&PendingCommand> {
        self.pending.as_ref()
    }

    /// Decides whether a mutation may apply now.
    ///
    /// Mutations outside any bundle, and mutations on customized bundles, proceed. Anything
    /// else becomes the pending command, replacing (and dropping) an older one.
    pub fn check(&mut self, mutation: Mutation) -> GuardDecision {
        let Some(bundle) = mutation.bundle() else {
            return GuardDecision::Proceed(mutation);
        };

        if self.is_customized(bundle) {
            return GuardDecision::Proceed(mutation);
        }

        let pending = PendingCommand { bundle, mutation };

        self.pending = Some(pending.clone());

        GuardDecision::Suspend(pending)
    }

    /// Removes the pending command so it can be applied.
    ///
    /// Its bundle returns to [`GuardState::Untouched`] until [`Self::mark_customized`] is
    /// called.
    pub fn take_pending(&mut self) -> Option<PendingCommand> {
        self.pending.take()
    }

    /// Records a confirmed customization.
    pub fn mark_customized(&mut self, bundle: LineId) {
        match self.scope {
            GuardScope::Bundle => {
                self.customized.insert(bundle);
            }
            GuardScope::Session => self.session_customized = true,
        }
    }

    /// Discards the pending command.
    pub fn cancel(&mut self) -> Option<PendingCommand> {
        self.pending.take()
    }

    /// Forgets bundles that no longer exist.
    pub fn retain_bundles(&mut self, exists: impl Fn(LineId) -> bool) {
        self.customized.retain(|bundle| exists(*bundle));

        if self
            .pending
            .as_ref()
            .is_some_and(|pending| !exists(pending.bundle))
        {
            self.pending = None;
        }
    }

    /// Back to the initial state.
    pub fn reset(&mut self) {
        self.customized.clear();
        self.session_customized = false;
        self.pending = None;
    }

    fn is_customized(&self, bundle: LineId) -> bool {
        match self.scope {
            GuardScope::Bundle => self.customized.contains(&bundle),
            GuardScope::Session => self.session_customized,
        }
    }
}
