//! Persisted drafts: the cart and the in-progress booking form
//!
//! A [`DraftStore`] is a plain key/value store of JSON documents with
//! last-write-wins semantics. [`Drafts`] layers the two typed documents the
//! checkout flow uses on top of it.

mod file;
mod memory;

use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use crate::cart::Cart;
use crate::error::Result;
use crate::validation::BookingDraft;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key of the cart document
pub const CART_KEY: &str = "cart";

/// Key of the booking draft document
pub const BOOKING_KEY: &str = "bookingData";

/// Durable key/value storage for raw JSON documents
pub trait DraftStore: Send + Sync {
    /// The document stored under `key`, or `None` if there is none
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the document stored under `key`
    fn set(&self, key: &str, document: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn clear(&self, key: &str) -> Result<()>;
}

/// Typed access to the cart and booking drafts
#[derive(Debug, Clone)]
pub struct Drafts<S> {
    store: S,
}

impl<S: DraftStore> Drafts<S> {
    /// Wrap a store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The persisted cart; empty when absent or unreadable
    pub fn cart(&self) -> Result<Cart> {
        Ok(self.load::<Cart>(CART_KEY)?.unwrap_or_default())
    }

    /// Persist `cart`, replacing the previous one
    pub fn save_cart(&self, cart: &Cart) -> Result<()> {
        self.save(CART_KEY, cart)
    }

    /// Remove the persisted cart
    pub fn clear_cart(&self) -> Result<()> {
        self.store.clear(CART_KEY)
    }

    /// The persisted booking draft, if any
    pub fn booking(&self) -> Result<Option<BookingDraft>> {
        self.load(BOOKING_KEY)
    }

    /// Persist `draft`, replacing the previous one
    pub fn save_booking(&self, draft: &BookingDraft) -> Result<()> {
        self.save(BOOKING_KEY, draft)
    }

    /// Remove the persisted booking draft
    pub fn clear_booking(&self) -> Result<()> {
        self.store.clear(BOOKING_KEY)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(document) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<T>(&document) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("ignoring unreadable {} draft: {}", key, err);
                Ok(None)
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let document = serde_json::to_string(value)?;
        self.store.set(key, &document)
    }
}
