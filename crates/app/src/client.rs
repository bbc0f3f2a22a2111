//! Cart service client.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    auth::BearerToken,
    wire::{CartRequest, CartSnapshot, Envelope},
};

/// Message used when the server gives no reason for a failure
pub const GENERIC_FAILURE: &str = "The cart could not be updated. Please try again.";

/// Errors talking to the cart service.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport failure or timeout
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the request
    #[error("cart service returned {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Server message, or a generic one
        message: String,
    },

    /// The response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A successful fetch carried no cart
    #[error("cart service returned no cart")]
    MissingCart,
}

impl SyncError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> &str {
        match self {
            Self::Server { message, .. } => message,
            Self::Http(_) | Self::Decode(_) | Self::MissingCart => GENERIC_FAILURE,
        }
    }
}

/// Remote cart storage.
#[automock]
#[async_trait]
pub trait CartService: Send + Sync {
    /// Fetches the current cart.
    async fn fetch(&self, token: &BearerToken) -> Result<CartSnapshot, SyncError>;

    /// Sends one mutation, returning the updated cart if the server included it.
    async fn send(
        &self,
        token: &BearerToken,
        request: CartRequest,
    ) -> Result<Option<CartSnapshot>, SyncError>;
}

/// [`CartService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCartService {
    base_url: String,
    http: Client,
}

impl HttpCartService {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, http })
    }

    fn cart_url(&self) -> String {
        format!("{}/cart", self.base_url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &BearerToken,
    ) -> Result<Option<T>, SyncError> {
        let response = request.bearer_auth(token.expose()).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
                .ok()
                .and_then(|envelope| envelope.message);

            return Err(rejected(status, message));
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)?;

        if !envelope.success {
            return Err(rejected(status, envelope.message));
        }

        Ok(envelope.data)
    }
}

fn rejected(status: StatusCode, message: Option<String>) -> SyncError {
    let message = message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    SyncError::Server {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CartService for HttpCartService {
    async fn fetch(&self, token: &BearerToken) -> Result<CartSnapshot, SyncError> {
        debug!(url = %self.cart_url(), "fetching cart");

        self.execute(self.http.get(self.cart_url()), token)
            .await?
            .ok_or(SyncError::MissingCart)
    }

    async fn send(
        &self,
        token: &BearerToken,
        request: CartRequest,
    ) -> Result<Option<CartSnapshot>, SyncError> {
        let url = self.cart_url();

        debug!(
            method = request.method(),
            item_type = %request.item_type(),
            "sending cart mutation"
        );

        let builder = match &request {
            CartRequest::Add(body) => self.http.post(url).json(body),
            CartRequest::Update(body) => self.http.put(url).json(body),
            CartRequest::Delete(body) => self.http.delete(url).json(body),
        };

        self.execute(builder, token).await
    }
}
