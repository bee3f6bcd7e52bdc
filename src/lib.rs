//! RumahRapih storefront client
//!
//! A Rust client for the RumahRapih home-services booking platform: browse
//! categories and services, keep a cart, fill in a booking, upload proof of
//! payment and check a booking's status.
//!
//! The checkout itself is a state machine ([`flow::CheckoutFlow`]) over two
//! collaborators: a [`store::DraftStore`] holding the cart and booking drafts,
//! and a [`api::BookingService`] talking to the booking API. Rendering is left
//! to the caller.

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flow;
pub mod pricing;
pub mod route;
pub mod status;
pub mod store;
pub mod validation;

use std::sync::Arc;

use reqwest::Client;
use url::Url;

use crate::api::BookingApi;
use crate::config::{ClientConfig, ClientOptions};
use crate::error::Result;
use crate::flow::CheckoutFlow;
use crate::store::DraftStore;

/// The main entry point for the storefront client
pub struct RumahRapih {
    /// Where the API and storage live
    pub config: Arc<ClientConfig>,
    /// Client options
    pub options: ClientOptions,
    /// HTTP client shared by every request
    pub http_client: Client,
}

impl RumahRapih {
    /// Create a new client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use rumahrapih_client::{RumahRapih, config::ClientConfig};
    ///
    /// let config = ClientConfig::new("https://api.example.com/api", "https://api.example.com/storage")?;
    /// let client = RumahRapih::new(config)?;
    /// # Ok::<(), rumahrapih_client::error::Error>(())
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::new_with_options(config, ClientOptions::default())
    }

    /// Create a new client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use rumahrapih_client::{RumahRapih, config::{ClientConfig, ClientOptions}};
    ///
    /// let config = ClientConfig::new("https://api.example.com/api", "https://api.example.com/storage")?;
    /// let options = ClientOptions::default().with_request_timeout(Some(Duration::from_secs(10)));
    /// let client = RumahRapih::new_with_options(config, options)?;
    /// # Ok::<(), rumahrapih_client::error::Error>(())
    /// ```
    pub fn new_with_options(config: ClientConfig, options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            config: Arc::new(config),
            options,
            http_client,
        })
    }

    /// Create a client from `RUMAHRAPIH_API_URL` and `RUMAHRAPIH_STORAGE_URL`
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The HTTP booking API client
    pub fn api(&self) -> BookingApi {
        BookingApi::new(
            self.config.clone(),
            self.options.clone(),
            self.http_client.clone(),
        )
    }

    /// Start a checkout flow whose drafts live in `store`
    ///
    /// # Example
    ///
    /// ```
    /// use rumahrapih_client::{RumahRapih, config::ClientConfig, store::MemoryStore};
    ///
    /// let config = ClientConfig::new("https://api.example.com/api", "https://api.example.com/storage")?;
    /// let client = RumahRapih::new(config)?;
    /// let flow = client.checkout(MemoryStore::new());
    /// assert_eq!(flow.step(), rumahrapih_client::flow::Step::Browsing);
    /// # Ok::<(), rumahrapih_client::error::Error>(())
    /// ```
    pub fn checkout<S: DraftStore>(&self, store: S) -> CheckoutFlow<S, BookingApi> {
        CheckoutFlow::new(store, self.api()).with_popular_limit(self.options.popular_limit)
    }

    /// Absolute URL of a stored asset such as a thumbnail or payment proof
    pub fn asset_url(&self, path: &str) -> Result<Url> {
        self.config.asset_url(path)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::api::{BookingApi, BookingService, ProofFile};
    pub use crate::config::{ClientConfig, ClientOptions};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::flow::{CheckoutFlow, FlowState, Step};
    pub use crate::route::Route;
    pub use crate::store::{FileStore, MemoryStore};
    pub use crate::validation::{BookingDraft, BookingLookup};
    pub use crate::RumahRapih;
}
