//! Configuration for the storefront client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the booking API base URL
pub const API_URL_ENV: &str = "RUMAHRAPIH_API_URL";

/// Environment variable holding the storage (asset) base URL
pub const STORAGE_URL_ENV: &str = "RUMAHRAPIH_STORAGE_URL";

/// Where the booking API and its file storage live
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the booking API, e.g. `https://api.example.com/api`
    pub api_url: Url,
    /// Base URL under which thumbnails and payment proofs are served
    pub storage_url: Url,
}

impl ClientConfig {
    /// Create a new configuration, validating both URLs
    pub fn new(api_url: &str, storage_url: &str) -> Result<Self> {
        let api_url = parse_base(api_url, "api_url")?;
        let storage_url = parse_base(storage_url, "storage_url")?;
        Ok(Self { api_url, storage_url })
    }

    /// Read the configuration from `RUMAHRAPIH_API_URL` and `RUMAHRAPIH_STORAGE_URL`
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var(API_URL_ENV)
            .map_err(|_| Error::config(format!("{} environment variable not found", API_URL_ENV)))?;
        let storage_url = std::env::var(STORAGE_URL_ENV).map_err(|_| {
            Error::config(format!("{} environment variable not found", STORAGE_URL_ENV))
        })?;
        Self::new(&api_url, &storage_url)
    }

    /// Absolute URL of an API endpoint, `path` given without a leading slash
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.api_url.join(path.trim_start_matches('/'))?)
    }

    /// Absolute URL of a stored asset such as a thumbnail or payment proof
    pub fn asset_url(&self, path: &str) -> Result<Url> {
        Ok(self.storage_url.join(path.trim_start_matches('/'))?)
    }
}

/// Joining relative paths only works against a base ending in `/`.
fn parse_base(raw: &str, name: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::config(format!("{} cannot be empty", name)));
    }
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::config(format!("{} is not a base URL: {}", name, raw)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Tunables for the HTTP client and the storefront pages
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Value of the `X-Client-Info` header sent with each request
    pub client_info: String,

    /// How many popular services the home page asks for
    pub popular_limit: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            client_info: format!("rumahrapih-client/{}", env!("CARGO_PKG_VERSION")),
            popular_limit: 5,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the client info header value
    pub fn with_client_info(mut self, value: &str) -> Self {
        self.client_info = value.to_string();
        self
    }

    /// Set the number of popular services shown on the home page
    pub fn with_popular_limit(mut self, value: u32) -> Self {
        self.popular_limit = value;
        self
    }
}
