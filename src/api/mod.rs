//! Client for the remote booking API
//!
//! [`BookingService`] is the seam the checkout flow talks through;
//! [`BookingApi`] implements it over HTTP. Errors are classified only as
//! "not found" versus everything else, and nothing is retried or cached.

mod types;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use std::sync::Arc;

use crate::config::{ClientConfig, ClientOptions};
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::validation::BookingLookup;

pub use types::*;

/// Operations the storefront needs from the booking backend
#[async_trait]
pub trait BookingService: Send + Sync {
    /// `GET /categories`
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    /// `GET /services?limit=N&is_popular=1`
    async fn fetch_popular_services(&self, limit: u32) -> Result<Vec<HomeService>>;

    /// `GET /category/{slug}`; a missing category is [`Error::NotFound`]
    async fn fetch_category_by_slug(&self, slug: &str) -> Result<Category>;

    /// `GET /service/{slug}`; a missing service is [`Error::NotFound`]
    async fn fetch_service_by_slug(&self, slug: &str) -> Result<HomeService>;

    /// `POST /booking-transaction` as multipart
    async fn submit_booking(&self, submission: BookingSubmission) -> Result<BookingReceipt>;

    /// `POST /check-booking`; `Ok(None)` when no booking matches
    async fn check_booking(&self, lookup: &BookingLookup) -> Result<Option<BookingDetails>>;
}

/// HTTP implementation of [`BookingService`]
#[derive(Clone)]
pub struct BookingApi {
    config: Arc<ClientConfig>,
    options: ClientOptions,
    client: Client,
}

impl BookingApi {
    /// Create a new BookingApi sharing an existing HTTP client
    pub fn new(config: Arc<ClientConfig>, options: ClientOptions, client: Client) -> Self {
        Self {
            config,
            options,
            client,
        }
    }

    /// The configuration this client talks to
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl BookingService for BookingApi {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let url = self.config.endpoint("categories")?;

        Fetch::get(&self.client, url)
            .header("X-Client-Info", &self.options.client_info)
            .execute::<Vec<Category>>()
            .await
    }

    async fn fetch_popular_services(&self, limit: u32) -> Result<Vec<HomeService>> {
        let url = self.config.endpoint("services")?;

        Fetch::get(&self.client, url)
            .header("X-Client-Info", &self.options.client_info)
            .query("limit", limit)
            .query("is_popular", 1)
            .execute::<Vec<HomeService>>()
            .await
    }

    async fn fetch_category_by_slug(&self, slug: &str) -> Result<Category> {
        let url = self.config.endpoint(&format!("category/{}", slug))?;

        Fetch::get(&self.client, url)
            .header("X-Client-Info", &self.options.client_info)
            .execute::<Category>()
            .await
    }

    async fn fetch_service_by_slug(&self, slug: &str) -> Result<HomeService> {
        let url = self.config.endpoint(&format!("service/{}", slug))?;

        Fetch::get(&self.client, url)
            .header("X-Client-Info", &self.options.client_info)
            .execute::<HomeService>()
            .await
    }

    async fn submit_booking(&self, submission: BookingSubmission) -> Result<BookingReceipt> {
        let url = self.config.endpoint("booking-transaction")?;
        debug!(
            "submitting booking for {} service(s)",
            submission.service_ids.len()
        );
        let form = submission.into_form()?;

        let receipt = Fetch::post(&self.client, url)
            .header("X-Client-Info", &self.options.client_info)
            .multipart(form)
            .execute::<BookingReceipt>()
            .await;

        match receipt {
            // A 2xx without a transaction id is not a booking we can point the user to.
            Ok(receipt) if receipt.booking_trx_id.is_empty() => {
                error!("booking accepted without a booking_trx_id");
                Err(Error::Api {
                    status: 200,
                    message: "response is missing booking_trx_id".to_string(),
                })
            }
            Ok(receipt) => Ok(receipt),
            Err(Error::NotFound(path)) => Err(Error::Api {
                status: 404,
                message: format!("{} not found", path),
            }),
            Err(err) => Err(err),
        }
    }

    async fn check_booking(&self, lookup: &BookingLookup) -> Result<Option<BookingDetails>> {
        let url = self.config.endpoint("check-booking")?;

        let result = Fetch::post(&self.client, url)
            .header("X-Client-Info", &self.options.client_info)
            .json(lookup)?
            .execute::<BookingDetails>()
            .await;

        match result {
            Ok(details) => Ok(Some(details)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
