//! The cart as seen by a storefront.
//!
//! [`Cart`] pairs each store action with the notification a shopper should
//! see, and turns away ticket requests past availability before they reach
//! the reducer.

use crate::checkout::{CartSummary, OrderDraft, OrderLine};
use crate::config::CartConfig;
use crate::error::Result;
use crate::reducer::{CartAction, CartEnvironment, CartReducer};
use crate::types::{
    BookingId, CartState, Notification, Section, Severity, TicketBooking, TicketRecord,
    WorkerBooking, WorkerRecord,
};
use bazaar_core::effect::{Effect, EffectId};
use bazaar_core::environment::Clock;
use bazaar_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Registration id of the notification auto-hide timer
pub const NOTIFICATION_TIMER: EffectId = EffectId::new("cart.notification.auto_hide");

/// Notification texts shown by [`Cart`]
pub mod messages {
    /// Shown after a worker is booked
    pub const WORKER_ADDED: &str = "Worker added to cart";
    /// Shown after a ticket is booked
    pub const TICKET_ADDED: &str = "Ticket added successfully to Cart";
    /// Shown when a ticket request exceeds availability
    pub const MAX_TICKETS_REACHED: &str = "Maximum available tickets reached";
}

/// Store type backing a [`Cart`]
pub type CartStore = Store<CartState, CartAction, CartEnvironment, CartReducer>;

/// One shopper's cart
///
/// Construct one per session and pass it to whatever needs it. Clones share
/// the same store.
#[derive(Clone)]
pub struct Cart {
    store: CartStore,
    notification_ttl: Duration,
}

impl Cart {
    /// Creates an empty cart
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: &CartConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_state(CartState::new(), config, clock)
    }

    /// Creates a cart that starts from `state`
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::InvalidConfig`] if `config` fails validation.
    pub fn with_state(state: CartState, config: &CartConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let store = Store::with_config(
            state,
            CartReducer::new(),
            CartEnvironment::new(clock),
            &config.store_config(),
        );

        Ok(Self {
            store,
            notification_ttl: config.notification_ttl(),
        })
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Books a worker (or one more hour of one) and confirms it
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    #[tracing::instrument(skip(self, record), fields(worker_id = %record.id))]
    pub async fn add_worker(&self, record: WorkerRecord) -> Result<()> {
        self.store.send(CartAction::AddWorkerBooking(record)).await?;
        tracing::debug!("Worker booked");
        self.show_notification(messages::WORKER_ADDED, Severity::Success)
            .await
    }

    /// Books a ticket (or one more of it)
    ///
    /// Returns `Ok(false)` and shows an error notification when the cart
    /// already holds as many of the ticket as the listing offers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    #[tracing::instrument(skip(self, record), fields(ticket_id = %record.id))]
    pub async fn add_ticket(&self, record: TicketRecord) -> Result<bool> {
        let ceiling = record.ceiling();
        let held = self
            .store
            .state(|state| state.ticket(&record.id).map(|booking| booking.quantity))
            .await;

        if held.is_some_and(|quantity| quantity >= ceiling) {
            tracing::info!(ceiling, "Rejected ticket: availability reached");
            self.show_notification(messages::MAX_TICKETS_REACHED, Severity::Error)
                .await?;
            return Ok(false);
        }

        self.store.send(CartAction::AddTicketBooking(record)).await?;
        tracing::debug!("Ticket booked");
        self.show_notification(messages::TICKET_ADDED, Severity::Success)
            .await?;
        Ok(true)
    }

    /// Removes a booking from either section
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    pub async fn remove(&self, id: impl Into<BookingId>) -> Result<()> {
        self.store.send(CartAction::RemoveItem { id: id.into() }).await?;
        Ok(())
    }

    /// Sets a booking's quantity; zero or less removes it
    ///
    /// Returns `Ok(false)` and shows an error notification when a ticket
    /// quantity above availability is requested. The cart is left unchanged
    /// in that case.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    #[tracing::instrument(skip(self, id), fields(booking_id = tracing::field::Empty))]
    pub async fn update_quantity(&self, id: impl Into<BookingId>, quantity: i64) -> Result<bool> {
        let id = id.into();
        tracing::Span::current().record("booking_id", tracing::field::display(&id));

        let available = self
            .store
            .state(|state| state.ticket(&id).map(|booking| booking.available_tickets))
            .await;

        if let Some(available) = available.filter(|available| quantity > i64::from(*available)) {
            tracing::info!(available, "Rejected ticket quantity above availability");
            self.show_notification(messages::MAX_TICKETS_REACHED, Severity::Error)
                .await?;
            return Ok(false);
        }

        self.store
            .send(CartAction::UpdateQuantity { id, quantity })
            .await?;
        Ok(true)
    }

    /// Empties both sections
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    pub async fn clear(&self) -> Result<()> {
        self.store.send(CartAction::ClearCart).await?;
        Ok(())
    }

    /// Switches the foregrounded section
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    pub async fn set_active_section(&self, section: Section) -> Result<()> {
        self.store.send(CartAction::SetActiveSection(section)).await?;
        Ok(())
    }

    /// Shows `message` and schedules it to hide after the configured TTL
    ///
    /// A pending auto-hide from an earlier message is cancelled before the
    /// new message is applied, so a timer that fires meanwhile can only hide
    /// the old one. The new message always gets its full TTL.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    pub async fn show_notification(&self, message: impl Into<String>, severity: Severity) -> Result<()> {
        self.store.run_effect(Effect::Cancel(NOTIFICATION_TIMER))?;
        self.store
            .send(CartAction::ShowNotification {
                message: message.into(),
                severity,
            })
            .await?;

        self.store.run_effect(
            Effect::Delay {
                duration: self.notification_ttl,
                action: Box::new(CartAction::HideNotification),
            }
            .cancellable(NOTIFICATION_TIMER),
        )?;
        Ok(())
    }

    /// Hides the current message and drops its pending auto-hide
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if the cart has been shut down.
    pub async fn hide_notification(&self) -> Result<()> {
        self.store.send(CartAction::HideNotification).await?;
        self.store.run_effect(Effect::Cancel(NOTIFICATION_TIMER))?;
        Ok(())
    }

    /// Copy of the whole cart state
    pub async fn snapshot(&self) -> CartState {
        self.store.state(Clone::clone).await
    }

    /// Worker bookings in insertion order
    pub async fn workers_bookings(&self) -> Vec<WorkerBooking> {
        self.store.state(|state| state.workers_bookings.clone()).await
    }

    /// Ticket bookings in insertion order
    pub async fn events_bookings(&self) -> Vec<TicketBooking> {
        self.store.state(|state| state.events_bookings.clone()).await
    }

    /// Foregrounded section
    pub async fn active_section(&self) -> Section {
        self.store.state(|state| state.active_section).await
    }

    /// Message currently shown
    pub async fn notification(&self) -> Option<Notification> {
        self.store.state(|state| state.notification.clone()).await
    }

    /// Whether an auto-hide is still scheduled
    #[must_use]
    pub fn notification_pending(&self) -> bool {
        self.store.is_in_flight(&NOTIFICATION_TIMER)
    }

    /// Every booking, workers first
    pub async fn cart_items(&self) -> Vec<OrderLine> {
        self.store
            .state(|state| state.cart_items().map(OrderLine::from).collect::<Vec<_>>())
            .await
    }

    /// Number of bookings across both sections
    pub async fn item_count(&self) -> usize {
        self.store.state(CartState::item_count).await
    }

    /// Totals for one section
    pub async fn summary(&self, section: Section) -> CartSummary {
        self.store
            .state(|state| CartSummary::for_section(state, section))
            .await
    }

    /// The active section as an order draft
    pub async fn order_draft(&self) -> OrderDraft {
        self.store.state(OrderDraft::from_state).await
    }

    /// Actions the cart applied on its own, such as the auto-hide
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartAction> {
        self.store.subscribe_actions()
    }

    /// Stops accepting actions and waits for running effects
    ///
    /// # Errors
    ///
    /// Returns [`crate::CartError::Store`] if effects are still running when
    /// the configured shutdown timeout expires.
    pub async fn shutdown(&self) -> Result<()> {
        self.store.shutdown(self.store.shutdown_timeout()).await?;
        Ok(())
    }
}
