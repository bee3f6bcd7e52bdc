//! States of the checkout flow

use std::fmt;

use crate::api::{BookingDetails, BookingReceipt, Category, HomeService};
use crate::cart::Cart;
use crate::pricing::Totals;
use crate::status::ProgressStage;
use crate::validation::{BookingDraft, BookingLookup, Issues};

/// Which screen the flow is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Browsing,
    Cart,
    Booking,
    Payment,
    Success,
    Lookup,
}

/// Actions that wait on the network and must not be started twice at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddToCart,
    ResolveCart,
    SubmitPayment,
    Lookup,
}

impl Action {
    /// Whether the action belongs to the screen it was started on
    ///
    /// These flags lapse on navigation, so leaving and re-entering a screen
    /// is never refused because of a response that will be discarded anyway.
    pub(crate) fn follows_navigation(self) -> bool {
        matches!(self, Action::ResolveCart | Action::Lookup)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::AddToCart => "adding to cart",
            Action::ResolveCart => "loading cart services",
            Action::SubmitPayment => "payment submission",
            Action::Lookup => "booking lookup",
        };
        f.write_str(name)
    }
}

/// Current flow state together with the data its screen shows
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Browsing,
    Cart(CartView),
    Booking(BookingForm),
    Payment(PaymentView),
    Success(BookingReceipt),
    Lookup(LookupView),
}

impl FlowState {
    pub fn step(&self) -> Step {
        match self {
            FlowState::Browsing => Step::Browsing,
            FlowState::Cart(_) => Step::Cart,
            FlowState::Booking(_) => Step::Booking,
            FlowState::Payment(_) => Step::Payment,
            FlowState::Success(_) => Step::Success,
            FlowState::Lookup(_) => Step::Lookup,
        }
    }
}

/// The cart screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartView {
    pub cart: Cart,
    /// Resolved services, positionally matching `cart`
    pub services: Vec<HomeService>,
    pub totals: Totals,
    pub loading: bool,
}

impl CartView {
    pub(crate) fn resolved(cart: Cart, services: Vec<HomeService>) -> Self {
        let totals = Totals::from_services(&services);
        Self {
            cart,
            services,
            totals,
            loading: false,
        }
    }

    /// Whether "Continue" is offered; an empty cart cannot proceed to booking
    pub fn can_continue(&self) -> bool {
        !self.loading && !self.cart.is_empty()
    }
}

/// The booking form screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    pub draft: BookingDraft,
    pub issues: Issues,
}

/// The payment screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentView {
    /// The saved booking draft; `None` renders the summary fields empty
    pub booking: Option<BookingDraft>,
    pub services: Vec<HomeService>,
    pub service_ids: Vec<i64>,
    pub totals: Totals,
    pub issues: Issues,
    /// Generic message after a failed submission
    pub submit_error: Option<String>,
    pub loading: bool,
}

/// Outcome of the latest booking lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LookupOutcome {
    #[default]
    Idle,
    Found(Box<BookingDetails>),
    NotFound,
    Failed(String),
}

impl LookupOutcome {
    /// Progress of the found booking, if any
    pub fn progress(&self) -> Option<ProgressStage> {
        match self {
            LookupOutcome::Found(details) => Some(ProgressStage::of(details)),
            _ => None,
        }
    }
}

/// The "check my booking" screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupView {
    pub request: BookingLookup,
    pub issues: Issues,
    pub outcome: LookupOutcome,
    pub loading: bool,
}

/// A part of a page that loads on its own and may fail on its own
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Loaded(T),
    /// Message to show in place of the section
    Failed(String),
}

impl<T> Section<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Section::Loaded(value) => Some(value),
            Section::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Section::Loaded(_) => None,
            Section::Failed(message) => Some(message),
        }
    }
}

/// Data for the home page
#[derive(Debug, Clone, PartialEq)]
pub struct HomePage {
    pub categories: Section<Vec<Category>>,
    pub popular_services: Section<Vec<HomeService>>,
}

/// Data for a service details page
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDetails {
    pub service: HomeService,
    /// Whether the service is already in the cart
    pub in_cart: bool,
}
