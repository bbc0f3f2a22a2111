//! Cart session
//!
//! Owns the editor, the bearer token and the sequence numbers that order server snapshots.
//! Every accepted mutation is applied locally first, then sent; the server snapshot that comes
//! back replaces the local cart unless a newer one was already applied.

use mealcart::{
    cart::{Cart, CartError},
    editor::{CartEditor, EditOutcome},
    guard::{GuardScope, GuardState, PendingCommand},
    lines::LineId,
    mutations::CartAction,
};
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    auth::BearerToken,
    client::{CartService, SyncError},
    wire::{CartRequest, CartSnapshot, SnapshotError},
};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The edit is invalid for the current cart; nothing was sent.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The cart service call failed. Local state is kept as is.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The server snapshot could not be turned into a cart.
    #[error("invalid cart snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// A request ready to be sent, numbered in issue order.
#[derive(Debug, Clone)]
pub struct Ticket {
    sequence: u64,
    token: BearerToken,
    request: CartRequest,
}

impl Ticket {
    /// Issue order of the request
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Request to send
    pub fn request(&self) -> &CartRequest {
        &self.request
    }
}

/// Result of preparing an edit.
#[derive(Debug)]
pub enum Prepared {
    /// No bearer token; nothing was applied or sent.
    Disabled,

    /// The edit touches an untouched mealkit and waits for confirmation.
    AwaitingConfirmation(PendingCommand),

    /// The edit was applied locally and must be sent.
    Ready(Ticket),
}

/// Result of a dispatched edit.
#[derive(Debug)]
pub enum Dispatch {
    /// No bearer token; nothing was applied or sent.
    Disabled,

    /// The edit waits for confirmation.
    AwaitingConfirmation(PendingCommand),

    /// The server snapshot replaced the local cart.
    Synced,

    /// A newer snapshot had already been applied; the response was discarded.
    Stale,
}

/// Session-scoped cart state.
#[derive(Debug)]
pub struct CartSession<S> {
    service: S,
    token: Option<BearerToken>,
    editor: CartEditor,
    currency: &'static Currency,
    loaded: bool,
    issued: u64,
    applied: u64,
}

impl<S: CartService> CartSession<S> {
    /// Creates a session without a token and with an empty, unloaded cart.
    pub fn new(service: S, currency: &'static Currency, scope: GuardScope) -> Self {
        Self {
            service,
            token: None,
            editor: CartEditor::new(Cart::new(currency), scope),
            currency,
            loaded: false,
            issued: 0,
            applied: 0,
        }
    }

    /// Stores the token used for every request. The cart is fetched again on next use.
    pub fn login(&mut self, token: BearerToken) {
        self.token = Some(token);
        self.loaded = false;
    }

    /// Forgets the token, the cart and the confirmation state. Responses still in flight are
    /// discarded when they arrive.
    pub fn logout(&mut self) {
        self.token = None;
        self.loaded = false;
        self.editor.clear();
        self.applied = self.issued;

        info!("cart session logged out");
    }

    /// Whether a token is present
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Current local cart
    pub fn cart(&self) -> &Cart {
        self.editor.cart()
    }

    /// Session currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Confirmation state of a mealkit line
    pub fn guard_state(&self, bundle: LineId) -> GuardState {
        self.editor.guard_state(bundle)
    }

    /// Command awaiting confirmation, if any
    pub fn pending(&self) -> Option<&PendingCommand> {
        self.editor.pending()
    }

    /// Fetches the cart unless it was already loaded.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the fetch fails or the snapshot is invalid.
    pub async fn load(&mut self) -> Result<Dispatch, SessionError> {
        if self.loaded && self.token.is_some() {
            return Ok(Dispatch::Synced);
        }

        self.refresh().await
    }

    /// Replaces the local cart with the server's.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the fetch fails or the snapshot is invalid.
    pub async fn refresh(&mut self) -> Result<Dispatch, SessionError> {
        let Some(token) = self.token.clone() else {
            return Ok(Dispatch::Disabled);
        };

        let sequence = self.next_sequence();
        let snapshot = self.service.fetch(&token).await?;

        self.apply_snapshot(sequence, snapshot)
    }

    /// Resolves an action and applies it locally, returning the request to send.
    ///
    /// Nothing is applied without a token, and an edit inside an untouched mealkit is held
    /// until [`Self::confirm`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cart`] if the action is invalid for the current cart.
    pub fn prepare(&mut self, action: CartAction) -> Result<Prepared, SessionError> {
        let Some(token) = self.token.clone() else {
            debug!("no bearer token, cart edits are disabled");

            return Ok(Prepared::Disabled);
        };

        let mutation = self.editor.cart().resolve(action)?;
        let request = CartRequest::from_mutation(&mutation, self.editor.cart())?;

        match self.editor.perform(mutation)? {
            EditOutcome::Applied { .. } => Ok(Prepared::Ready(self.issue(token, request))),
            EditOutcome::Suspended(pending) => {
                info!(
                    bundle = %pending.bundle(),
                    item_type = %pending.mutation().item_type(),
                    "mealkit edit awaits confirmation"
                );

                Ok(Prepared::AwaitingConfirmation(pending))
            }
        }
    }

    /// Applies the command awaiting confirmation, returning the request to send.
    ///
    /// Returns `None` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cart`] if the command no longer applies; it is dropped and the
    /// cart is unchanged.
    pub fn confirm(&mut self) -> Result<Option<Prepared>, SessionError> {
        let Some(token) = self.token.clone() else {
            return Ok(Some(Prepared::Disabled));
        };

        let Some(pending) = self.editor.pending() else {
            return Ok(None);
        };

        let request = match CartRequest::from_mutation(pending.mutation(), self.editor.cart()) {
            Ok(request) => request,
            Err(error) => {
                self.editor.cancel();

                return Err(error.into());
            }
        };

        let Some(EditOutcome::Applied { .. }) = self.editor.confirm()? else {
            return Ok(None);
        };

        Ok(Some(Prepared::Ready(self.issue(token, request))))
    }

    /// Discards the command awaiting confirmation.
    pub fn cancel(&mut self) -> Option<PendingCommand> {
        let cancelled = self.editor.cancel();

        if let Some(pending) = &cancelled {
            info!(bundle = %pending.bundle(), "mealkit edit cancelled");
        }

        cancelled
    }

    /// Sends a prepared request. Several may be in flight at once; pass each response to
    /// [`Self::reconcile`].
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] if the request fails.
    pub async fn send(&self, ticket: &Ticket) -> Result<Option<CartSnapshot>, SyncError> {
        info!(
            sequence = ticket.sequence,
            method = ticket.request.method(),
            item_type = %ticket.request.item_type(),
            "dispatching cart mutation"
        );

        self.service
            .send(&ticket.token, ticket.request.clone())
            .await
    }

    /// Applies a response to the request numbered `sequence`.
    ///
    /// Snapshots older than the newest applied one are discarded. A response without a cart
    /// triggers a fetch. Failures are returned as is; the optimistic local state is kept.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the request or the follow-up fetch failed or the
    /// snapshot is invalid.
    pub async fn reconcile(
        &mut self,
        sequence: u64,
        response: Result<Option<CartSnapshot>, SyncError>,
    ) -> Result<Dispatch, SessionError> {
        let snapshot = match response {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(sequence, %error, "cart sync failed");

                return Err(error.into());
            }
        };

        if self.is_stale(sequence) {
            return Ok(Dispatch::Stale);
        }

        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => {
                let Some(token) = self.token.clone() else {
                    return Ok(Dispatch::Disabled);
                };

                debug!(sequence, "response carried no cart, fetching");

                self.service.fetch(&token).await?
            }
        };

        self.apply_snapshot(sequence, snapshot)
    }

    /// Prepares, sends and reconciles one action.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the action is invalid, the request fails or the snapshot
    /// is invalid.
    pub async fn sync(&mut self, action: CartAction) -> Result<Dispatch, SessionError> {
        if let Dispatch::Disabled = self.load().await? {
            return Ok(Dispatch::Disabled);
        }

        let prepared = self.prepare(action)?;

        self.dispatch(prepared).await
    }

    /// Confirms the pending command, then sends and reconciles it.
    ///
    /// Returns `None` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the command no longer applies, the request fails or the
    /// snapshot is invalid.
    pub async fn confirm_and_sync(&mut self) -> Result<Option<Dispatch>, SessionError> {
        match self.confirm()? {
            Some(prepared) => Ok(Some(self.dispatch(prepared).await?)),
            None => Ok(None),
        }
    }

    async fn dispatch(&mut self, prepared: Prepared) -> Result<Dispatch, SessionError> {
        match prepared {
            Prepared::Disabled => Ok(Dispatch::Disabled),
            Prepared::AwaitingConfirmation(pending) => Ok(Dispatch::AwaitingConfirmation(pending)),
            Prepared::Ready(ticket) => {
                let response = self.send(&ticket).await;

                self.reconcile(ticket.sequence, response).await
            }
        }
    }

    fn issue(&mut self, token: BearerToken, request: CartRequest) -> Ticket {
        Ticket {
            sequence: self.next_sequence(),
            token,
            request,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn is_stale(&self, sequence: u64) -> bool {
        let stale = sequence <= self.applied;

        if stale {
            warn!(
                sequence,
                applied = self.applied,
                "discarding stale cart snapshot"
            );
        }

        stale
    }

    fn apply_snapshot(
        &mut self,
        sequence: u64,
        snapshot: CartSnapshot,
    ) -> Result<Dispatch, SessionError> {
        if self.is_stale(sequence) {
            return Ok(Dispatch::Stale);
        }

        let cart = snapshot.into_cart(self.currency)?;

        self.editor.replace_cart(cart);
        self.applied = sequence;
        self.loaded = true;

        debug!(sequence, "cart snapshot applied");

        Ok(Dispatch::Synced)
    }
}
