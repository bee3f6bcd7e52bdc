//! The shopping cart draft

use serde::{Deserialize, Serialize};

use crate::api::HomeService;

/// One service the user intends to book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub service_id: i64,
    pub slug: String,
    pub quantity: u32,
}

impl CartItem {
    /// A single unit of `service`
    pub fn for_service(service: &HomeService) -> Self {
        Self {
            service_id: service.id,
            slug: service.slug.clone(),
            quantity: 1,
        }
    }
}

/// Result of [`Cart::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The service was appended
    Added,
    /// The service was already present; the cart is unchanged
    AlreadyInCart,
}

/// Ordered cart items, unique by slug
///
/// Persisted as a plain JSON array of items. Loading goes through
/// [`Cart::from_items`], so a stored document with repeated slugs comes back
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Cart::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl Cart {
    /// Build a cart from persisted items, keeping the first item for each slug
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Cart::default();
        for item in items {
            if !cart.contains(&item.slug) {
                cart.items.push(item);
            }
        }
        cart
    }

    /// Whether an item with `slug` is present
    pub fn contains(&self, slug: &str) -> bool {
        self.items.iter().any(|item| item.slug == slug)
    }

    /// Whether `service` is present, matched by slug or id
    pub fn contains_service(&self, service: &HomeService) -> bool {
        self.items
            .iter()
            .any(|item| item.slug == service.slug || item.service_id == service.id)
    }

    /// Append `service` unless it is already in the cart
    pub fn add(&mut self, service: &HomeService) -> AddOutcome {
        if self.contains_service(service) {
            return AddOutcome::AlreadyInCart;
        }
        self.items.push(CartItem::for_service(service));
        AddOutcome::Added
    }

    /// Remove the item with `slug`; returns whether anything was removed
    pub fn remove(&mut self, slug: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.slug != slug);
        self.items.len() != before
    }

    /// Drop every item whose slug is in `slugs`; returns whether anything changed
    pub fn prune(&mut self, slugs: &[String]) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !slugs.contains(&item.slug));
        self.items.len() != before
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
