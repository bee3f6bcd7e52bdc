//! HTTP request helper for the booking API

use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    multipart, Client, Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Every API response wraps its payload in `{ "data": ... }`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Error bodies usually carry a `message`; anything else is passed through verbatim
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

enum Body {
    Json(Vec<u8>),
    Multipart(multipart::Form),
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: Url,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Body>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: Url, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));

        Self {
            client,
            url,
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request; invalid names or values are skipped
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Append a query parameter, keeping insertion order
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body)?;
        self.headers
            .insert("content-type", HeaderValue::from_static("application/json"));
        self.body = Some(Body::Json(json));
        Ok(self)
    }

    /// Add a multipart form body; reqwest sets the boundary header itself
    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Build the request
    fn build(self) -> RequestBuilder {
        let mut url = self.url;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        debug!("{} {}", self.method, url);

        let mut req = self.client.request(self.method, url).headers(self.headers);

        match self.body {
            Some(Body::Json(bytes)) => req = req.body(bytes),
            Some(Body::Multipart(form)) => req = req.multipart(form),
            None => {}
        }

        req
    }

    /// Execute the request and unwrap the `data` envelope
    ///
    /// A 404 status or a `null` payload becomes [`Error::NotFound`]; any other
    /// non-success status becomes [`Error::Api`].
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        let what = self.url.path().to_string();
        let response = self.build().send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(what));
        }

        if !status.is_success() {
            let text = response.text().await?;
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let bytes = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        envelope.data.ok_or_else(|| Error::not_found(what))
    }
}

fn error_message(text: &str) -> String {
    serde_json::from_str::<ErrorBody>(text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| text.to_string())
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get(client: &Client, url: Url) -> FetchBuilder<'_> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post(client: &Client, url: Url) -> FetchBuilder<'_> {
        FetchBuilder::new(client, url, Method::POST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"The email field is required."}"#),
            "The email field is required."
        );
        assert_eq!(error_message("Internal Server Error"), "Internal Server Error");
        assert_eq!(error_message(r#"{"errors":{}}"#), r#"{"errors":{}}"#);
    }

    #[test]
    fn test_envelope_null_data() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(envelope.data.is_none());
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert!(envelope.data.is_none());
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"data":7}"#).unwrap();
        assert_eq!(envelope.data, Some(7));
    }
}
