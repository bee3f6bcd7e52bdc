//! The checkout flow: Cart, Booking, Payment, Success, plus booking Lookup
//!
//! [`CheckoutFlow`] owns the current [`FlowState`] and exposes one method per
//! transition. Every method returns the [`Route`] the user lands on. Guards
//! that fail because a prerequisite is missing (an empty cart) redirect to
//! [`Route::Home`] instead of returning an error.
//!
//! Methods take `&self` so a UI can fire them from independent event
//! handlers. Two rules keep that safe:
//!
//! - each network-bound [`Action`] has an in-flight flag; starting it again
//!   before the first call settles fails with [`Error::Busy`]. Flags of
//!   screen-bound actions (cart resolution, lookup) lapse on navigation
//! - every navigation bumps an epoch; a response that settles after a newer
//!   navigation is dropped with [`Error::Superseded`] and commits nothing

mod state;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use futures_util::future::{join, join_all};
use log::{debug, error, info, warn};

use crate::api::{BookingReceipt, BookingService, BookingSubmission, Category, HomeService, ProofFile};
use crate::cart::{AddOutcome, Cart};
use crate::error::{Error, Result};
use crate::pricing::Totals;
use crate::route::Route;
use crate::store::{DraftStore, Drafts};
use crate::validation::{BookingDraft, BookingLookup, PaymentForm, Schema};

pub use state::*;

/// Message shown when the booking transaction could not be submitted
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit payment proof, please try again";

/// Default number of popular services on the home page
const DEFAULT_POPULAR_LIMIT: u32 = 5;

type Today = Box<dyn Fn() -> NaiveDate + Send + Sync>;

struct Inner {
    state: FlowState,
    epoch: u64,
    in_flight: Vec<Flight>,
    next_flight: u64,
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    id: u64,
    action: Action,
    /// Navigation epoch the action was started in
    epoch: u64,
}

impl Inner {
    fn is_live(&self, flight: &Flight) -> bool {
        !flight.action.follows_navigation() || flight.epoch == self.epoch
    }

    fn is_busy(&self, action: Action) -> bool {
        self.in_flight
            .iter()
            .any(|flight| flight.action == action && self.is_live(flight))
    }

    fn start(&mut self, action: Action) -> u64 {
        self.next_flight += 1;
        let id = self.next_flight;
        let epoch = self.epoch;
        self.in_flight.push(Flight { id, action, epoch });
        id
    }
}

/// Clears an action's in-flight flag when dropped, including on cancellation
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    id: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.in_flight.retain(|flight| flight.id != self.id);
    }
}

/// Outcome of fetching every cart item's service
struct Resolution {
    services: HashMap<String, HomeService>,
    failed: Vec<String>,
}

/// Checkout state machine over a draft store and a booking backend
pub struct CheckoutFlow<S, B> {
    drafts: Drafts<S>,
    service: B,
    popular_limit: u32,
    today: Today,
    inner: Mutex<Inner>,
}

impl<S: DraftStore, B: BookingService> CheckoutFlow<S, B> {
    /// Create a new flow in the `Browsing` state
    pub fn new(store: S, service: B) -> Self {
        Self {
            drafts: Drafts::new(store),
            service,
            popular_limit: DEFAULT_POPULAR_LIMIT,
            today: Box::new(|| Local::now().date_naive()),
            inner: Mutex::new(Inner {
                state: FlowState::Browsing,
                epoch: 0,
                in_flight: Vec::new(),
                next_flight: 0,
            }),
        }
    }

    /// Set how many popular services [`CheckoutFlow::home`] asks for
    pub fn with_popular_limit(mut self, limit: u32) -> Self {
        self.popular_limit = limit;
        self
    }

    /// Replace the clock used to seed the booking date
    pub fn with_today<F>(mut self, today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.today = Box::new(today);
        self
    }

    /// Typed access to the persisted drafts
    pub fn drafts(&self) -> &Drafts<S> {
        &self.drafts
    }

    /// The booking backend
    pub fn service(&self) -> &B {
        &self.service
    }

    /// A snapshot of the current state
    pub fn state(&self) -> FlowState {
        self.lock().state.clone()
    }

    /// The current step
    pub fn step(&self) -> Step {
        self.lock().state.step()
    }

    /// Whether `action` is waiting on a response
    pub fn is_in_flight(&self, action: Action) -> bool {
        self.lock().is_busy(action)
    }

    /// Whether any action is waiting on a response
    pub fn is_loading(&self) -> bool {
        let inner = self.lock();
        inner.in_flight.iter().any(|flight| inner.is_live(flight))
    }

    // ---- browsing ------------------------------------------------------

    /// Go back to browsing without loading anything
    pub fn go_home(&self) -> Route {
        self.navigate(FlowState::Browsing);
        Route::Home
    }

    /// Load the home page: categories and popular services, fetched together
    ///
    /// Each list succeeds or fails on its own; a failed list is reported as
    /// [`Section::Failed`] and does not hide the other one.
    pub async fn home(&self) -> Result<HomePage> {
        let epoch = self.navigate(FlowState::Browsing);
        let (categories, popular_services) = join(
            self.service.fetch_categories(),
            self.service.fetch_popular_services(self.popular_limit),
        )
        .await;
        self.ensure_current(epoch)?;
        Ok(HomePage {
            categories: section(categories, "Failed to load categories"),
            popular_services: section(popular_services, "Failed to load services"),
        })
    }

    /// Load a service details page
    pub async fn view_service(&self, slug: &str) -> Result<ServiceDetails> {
        let epoch = self.navigate(FlowState::Browsing);
        let service = self.service.fetch_service_by_slug(slug).await?;
        self.ensure_current(epoch)?;
        let in_cart = self.drafts.cart()?.contains_service(&service);
        Ok(ServiceDetails { service, in_cart })
    }

    /// Load a category page
    pub async fn view_category(&self, slug: &str) -> Result<Category> {
        let epoch = self.navigate(FlowState::Browsing);
        let category = self.service.fetch_category_by_slug(slug).await?;
        self.ensure_current(epoch)?;
        Ok(category)
    }

    // ---- cart ----------------------------------------------------------

    /// Add one unit of `service` to the persisted cart
    pub fn add_to_cart(&self, service: &HomeService) -> Result<AddOutcome> {
        let _guard = self.begin(Action::AddToCart)?;
        let mut cart = self.drafts.cart()?;
        let outcome = cart.add(service);
        if outcome == AddOutcome::Added {
            self.drafts.save_cart(&cart)?;
            info!("added {} to cart", service.slug);
        }
        Ok(outcome)
    }

    /// Remove the item with `slug` from the persisted cart and the open cart view
    pub fn remove_from_cart(&self, slug: &str) -> Result<bool> {
        let mut cart = self.drafts.cart()?;
        let removed = cart.remove(slug);
        if removed {
            self.drafts.save_cart(&cart)?;
        }

        let mut inner = self.lock();
        if let FlowState::Cart(view) = &mut inner.state {
            view.cart.remove(slug);
            view.services.retain(|service| service.slug != slug);
            view.totals = Totals::from_services(&view.services);
        }
        Ok(removed)
    }

    /// Browsing → Cart; resolves each item and drops the ones that no longer exist
    pub async fn open_cart(&self) -> Result<Route> {
        let cart = self.drafts.cart()?;
        if cart.is_empty() {
            self.navigate(FlowState::Cart(CartView::default()));
            return Ok(Route::Cart);
        }

        let (epoch, guard) = self.enter(
            FlowState::Cart(CartView {
                cart: cart.clone(),
                loading: true,
                ..CartView::default()
            }),
            Action::ResolveCart,
        );
        let resolution = self.resolve(&cart).await;
        drop(guard);
        self.ensure_current(epoch)?;

        let (cart, services) = self.settle(resolution)?;
        self.commit(epoch, FlowState::Cart(CartView::resolved(cart, services)))?;
        Ok(Route::Cart)
    }

    // ---- booking -------------------------------------------------------

    /// Cart → Booking; an empty cart redirects home
    ///
    /// The form starts from the saved draft, or blank with the date set to
    /// tomorrow when there is none.
    pub fn enter_booking(&self) -> Result<Route> {
        if let Err(err) = self.require_cart() {
            return self.redirect_home(err);
        }
        let draft = match self.drafts.booking()? {
            Some(draft) => draft,
            None => BookingDraft::seeded((self.today)()),
        };
        self.navigate(FlowState::Booking(BookingForm {
            draft,
            issues: Default::default(),
        }));
        Ok(Route::Booking)
    }

    /// Booking → Payment
    ///
    /// An invalid draft keeps the flow on the booking form with the issues
    /// attached and persists nothing.
    pub async fn submit_booking(&self, draft: BookingDraft) -> Result<Route> {
        match draft.check() {
            Ok(draft) => {
                self.drafts.save_booking(&draft)?;
                debug!("booking draft saved for {}", draft.email);
                self.enter_payment().await
            }
            Err(Error::Validation(issues)) => {
                let form = BookingForm {
                    draft,
                    issues: issues.clone(),
                };
                let mut inner = self.lock();
                if let FlowState::Booking(current) = &mut inner.state {
                    *current = form;
                } else {
                    inner.epoch += 1;
                    inner.state = FlowState::Booking(form);
                }
                Err(Error::Validation(issues))
            }
            Err(err) => Err(err),
        }
    }

    // ---- payment -------------------------------------------------------

    /// Entry to Payment: loads the draft and resolves the cart's services
    ///
    /// Items that fail to resolve are pruned from the persisted cart. If
    /// nothing is left the flow redirects home.
    pub async fn enter_payment(&self) -> Result<Route> {
        let cart = match self.require_cart() {
            Ok(cart) => cart,
            Err(err) => return self.redirect_home(err),
        };
        let booking = self.drafts.booking()?;
        let (epoch, guard) = self.enter(
            FlowState::Payment(PaymentView {
                booking: booking.clone(),
                loading: true,
                ..PaymentView::default()
            }),
            Action::ResolveCart,
        );

        let resolution = self.resolve(&cart).await;
        drop(guard);
        self.ensure_current(epoch)?;

        let (cart, services) = self.settle(resolution)?;
        if cart.is_empty() {
            return self.redirect_home(Error::prerequisite("no cart item could be resolved"));
        }

        let service_ids = services.iter().map(|service| service.id).collect();
        let totals = Totals::from_services(&services);
        self.commit(
            epoch,
            FlowState::Payment(PaymentView {
                booking,
                services,
                service_ids,
                totals,
                ..PaymentView::default()
            }),
        )?;
        Ok(Route::Payment)
    }

    /// Payment → Success
    ///
    /// On success both drafts are cleared and the success route is returned,
    /// also when the user navigated away while the request was pending; the
    /// Success state is then not shown but the transaction id still reaches
    /// the caller. A failed request leaves the drafts untouched, records a
    /// generic message on the payment view and returns the error.
    pub async fn submit_payment(&self, proof: Option<ProofFile>) -> Result<Route> {
        let view = match self.lock().state.clone() {
            FlowState::Payment(view) if !view.loading => view,
            FlowState::Payment(_) => return Err(Error::Busy(Action::ResolveCart)),
            _ => return Err(Error::prerequisite("payment step is not open")),
        };

        let form = PaymentForm {
            proof,
            service_ids: view.service_ids.clone(),
        };
        let (proof, service_ids) = match form.check() {
            Ok(PaymentForm {
                proof: Some(proof),
                service_ids,
            }) => (proof, service_ids),
            Ok(_) => return Err(Error::prerequisite("proof of payment missing")),
            Err(Error::Validation(issues)) => {
                self.update_payment(|view| view.issues = issues.clone());
                return Err(Error::Validation(issues));
            }
            Err(err) => return Err(err),
        };

        let guard = self.begin(Action::SubmitPayment)?;
        let epoch = {
            let mut inner = self.lock();
            if let FlowState::Payment(view) = &mut inner.state {
                view.issues = Default::default();
                view.submit_error = None;
            }
            inner.epoch
        };

        let submission = BookingSubmission {
            proof,
            booking: view.booking,
            service_ids,
        };
        let result = self.service.submit_booking(submission).await;
        drop(guard);

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(err) => {
                error!("booking submission failed: {}", err);
                if self.ensure_current(epoch).is_ok() {
                    self.update_payment(|view| {
                        view.submit_error = Some(SUBMIT_FAILED_MESSAGE.to_string())
                    });
                }
                return Err(err);
            }
        };

        // The booking exists server-side now, so the drafts are spent even if
        // the user has navigated away in the meantime.
        self.drafts.clear_cart()?;
        self.drafts.clear_booking()?;
        info!("booking {} created", receipt.booking_trx_id);

        let route = success_route(&receipt);
        if self.commit(epoch, FlowState::Success(receipt)).is_err() {
            debug!("success page skipped, the user navigated away");
        }
        Ok(route)
    }

    /// Show the success page for a booking reached by link
    pub fn show_success(&self, trx_id: &str, email: &str) -> Route {
        let receipt = BookingReceipt {
            booking_trx_id: trx_id.to_string(),
            email: email.to_string(),
        };
        let route = success_route(&receipt);
        self.navigate(FlowState::Success(receipt));
        route
    }

    // ---- lookup --------------------------------------------------------

    /// Browsing → Lookup
    pub fn open_lookup(&self) -> Route {
        self.navigate(FlowState::Lookup(LookupView::default()));
        Route::MyBooking
    }

    /// Look up an existing booking by transaction id and email
    ///
    /// "Not found" is a normal outcome recorded on the view; only transport
    /// failures are returned as errors.
    pub async fn lookup(&self, request: BookingLookup) -> Result<Route> {
        let epoch = {
            let mut inner = self.lock();
            if inner.state.step() != Step::Lookup {
                inner.epoch += 1;
                inner.state = FlowState::Lookup(LookupView::default());
            }
            inner.epoch
        };

        if let Err(err) = request.check() {
            if let Error::Validation(issues) = &err {
                self.update_lookup(|view| {
                    view.request = request.clone();
                    view.issues = issues.clone();
                });
            }
            return Err(err);
        }

        let guard = self.begin(Action::Lookup)?;
        self.update_lookup(|view| {
            view.request = request.clone();
            view.issues = Default::default();
            view.outcome = LookupOutcome::Idle;
            view.loading = true;
        });

        let result = self.service.check_booking(&request).await;
        drop(guard);
        self.ensure_current(epoch)?;

        let (outcome, failure) = match result {
            Ok(Some(details)) => (LookupOutcome::Found(Box::new(details)), None),
            Ok(None) => (LookupOutcome::NotFound, None),
            Err(err) if err.is_not_found() => (LookupOutcome::NotFound, None),
            Err(err) => {
                warn!("booking lookup failed: {}", err);
                (LookupOutcome::Failed(err.to_string()), Some(err))
            }
        };
        self.update_lookup(|view| {
            view.outcome = outcome;
            view.loading = false;
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(Route::MyBooking),
        }
    }

    // ---- internals -----------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, action: Action) -> Result<InFlight<'_>> {
        let mut inner = self.lock();
        if inner.is_busy(action) {
            return Err(Error::Busy(action));
        }
        let id = inner.start(action);
        Ok(InFlight {
            inner: &self.inner,
            id,
        })
    }

    fn navigate(&self, state: FlowState) -> u64 {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.state = state;
        inner.epoch
    }

    /// Navigate and start a screen-bound action in the new epoch
    fn enter(&self, state: FlowState, action: Action) -> (u64, InFlight<'_>) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.state = state;
        let id = inner.start(action);
        let guard = InFlight {
            inner: &self.inner,
            id,
        };
        (inner.epoch, guard)
    }

    fn ensure_current(&self, epoch: u64) -> Result<()> {
        if self.lock().epoch != epoch {
            debug!("dropping response from navigation epoch {}", epoch);
            return Err(Error::Superseded);
        }
        Ok(())
    }

    /// Replace the state if no navigation happened since `epoch`
    fn commit(&self, epoch: u64, state: FlowState) -> Result<()> {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return Err(Error::Superseded);
        }
        inner.state = state;
        Ok(())
    }

    fn update_payment(&self, update: impl FnOnce(&mut PaymentView)) {
        if let FlowState::Payment(view) = &mut self.lock().state {
            update(view);
        }
    }

    fn update_lookup(&self, update: impl FnOnce(&mut LookupView)) {
        if let FlowState::Lookup(view) = &mut self.lock().state {
            update(view);
        }
    }

    fn require_cart(&self) -> Result<Cart> {
        let cart = self.drafts.cart()?;
        if cart.is_empty() {
            return Err(Error::prerequisite("cart is empty"));
        }
        Ok(cart)
    }

    fn redirect_home(&self, reason: Error) -> Result<Route> {
        match reason {
            Error::PrerequisiteMissing(why) => {
                debug!("redirecting home: {}", why);
                Ok(self.go_home())
            }
            other => Err(other),
        }
    }

    /// Fetch every item's service concurrently
    async fn resolve(&self, cart: &Cart) -> Resolution {
        let lookups = cart
            .items()
            .iter()
            .map(|item| self.service.fetch_service_by_slug(&item.slug));
        let results = join_all(lookups).await;

        let mut resolution = Resolution {
            services: HashMap::with_capacity(results.len()),
            failed: Vec::new(),
        };
        for (item, result) in cart.items().iter().zip(results) {
            match result {
                Ok(service) => {
                    resolution.services.insert(item.slug.clone(), service);
                }
                Err(err) => {
                    warn!("dropping {} from cart: {}", item.slug, err);
                    resolution.failed.push(item.slug.clone());
                }
            }
        }
        resolution
    }

    /// Prune failed items from the cart as persisted now, which may differ
    /// from the snapshot that was resolved. Returns the resolved items and
    /// their services in cart order; items added meanwhile stay persisted but
    /// are not shown until the next resolution.
    fn settle(&self, resolution: Resolution) -> Result<(Cart, Vec<HomeService>)> {
        let mut current = self.drafts.cart()?;
        if current.prune(&resolution.failed) {
            self.drafts.save_cart(&current)?;
        }

        let Resolution { mut services, .. } = resolution;
        let mut shown = Vec::with_capacity(current.len());
        let mut resolved = Vec::with_capacity(current.len());
        for item in current.items() {
            if let Some(service) = services.remove(&item.slug) {
                shown.push(item.clone());
                resolved.push(service);
            }
        }
        Ok((Cart::from_items(shown), resolved))
    }
}

fn section<T>(result: Result<T>, message: &str) -> Section<T> {
    match result {
        Ok(value) => Section::Loaded(value),
        Err(err) => {
            warn!("{}: {}", message, err);
            Section::Failed(message.to_string())
        }
    }
}

fn success_route(receipt: &BookingReceipt) -> Route {
    Route::SuccessBooking {
        trx_id: receipt.booking_trx_id.clone(),
        email: receipt.email.clone(),
    }
}
