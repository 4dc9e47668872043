//! Cart reducer.
//!
//! Computes the next cart state from the current state and one action. Every
//! action is defined for every state; requests the cart cannot honour (a
//! ticket past its ceiling) leave the state untouched instead of failing.

use crate::types::{
    BookingId, CartState, Notification, Section, Severity, TicketBooking, TicketRecord,
    WorkerBooking, WorkerRecord,
};
use bazaar_core::{effect::Effect, environment::Clock, reducer::Reducer, SmallVec};
use std::sync::Arc;

/// Everything a shopper can do to the cart
#[derive(Clone, Debug, PartialEq)]
pub enum CartAction {
    /// Book a worker, or one more hour of an already booked worker
    AddWorkerBooking(WorkerRecord),
    /// Book a ticket, or one more of an already booked ticket
    AddTicketBooking(TicketRecord),
    /// Drop a booking from whichever section holds it
    RemoveItem {
        /// Booking to drop
        id: BookingId,
    },
    /// Set a booking's quantity; zero or less removes it
    UpdateQuantity {
        /// Booking to change
        id: BookingId,
        /// Requested quantity
        quantity: i64,
    },
    /// Switch the foregrounded section
    SetActiveSection(Section),
    /// Empty both sections
    ClearCart,
    /// Show a message
    ShowNotification {
        /// Message text
        message: String,
        /// Success or error
        severity: Severity,
    },
    /// Clear the message
    HideNotification,
}

/// Environment dependencies for the cart reducer
#[derive(Clone)]
pub struct CartEnvironment {
    /// Clock for stamping notifications
    pub clock: Arc<dyn Clock>,
}

impl CartEnvironment {
    /// Creates a new `CartEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Reducer for the shopping cart
#[derive(Clone, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add_worker(state: &mut CartState, record: WorkerRecord) {
        if let Some(existing) = state
            .workers_bookings
            .iter_mut()
            .find(|booking| booking.id == record.id)
        {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }

        state.workers_bookings.push(WorkerBooking::from_record(record));
    }

    /// Returns `false` when the booking already holds the listing's ceiling
    fn add_ticket(state: &mut CartState, record: TicketRecord) -> bool {
        if let Some(existing) = state
            .events_bookings
            .iter_mut()
            .find(|booking| booking.id == record.id)
        {
            // The listing being added is the freshest count of tickets left.
            let ceiling = record.ceiling();
            if existing.quantity >= ceiling {
                return false;
            }
            existing.quantity += 1;
            existing.available_tickets = ceiling;
            return true;
        }

        state.events_bookings.push(TicketBooking::from_record(record));
        true
    }

    fn remove(state: &mut CartState, id: &BookingId) {
        state.workers_bookings.retain(|booking| &booking.id != id);
        state.events_bookings.retain(|booking| &booking.id != id);
    }

    fn update_quantity(state: &mut CartState, id: &BookingId, quantity: i64) {
        if quantity <= 0 {
            Self::remove(state, id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        for booking in state
            .workers_bookings
            .iter_mut()
            .filter(|booking| &booking.id == id)
        {
            booking.quantity = quantity;
        }

        for booking in state
            .events_bookings
            .iter_mut()
            .filter(|booking| &booking.id == id)
        {
            if quantity > booking.available_tickets {
                tracing::debug!(
                    booking_id = %id,
                    requested = quantity,
                    available = booking.available_tickets,
                    "Ignored ticket quantity above availability"
                );
                continue;
            }
            booking.quantity = quantity;
        }
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::AddWorkerBooking(record) => Self::add_worker(state, record),
            CartAction::AddTicketBooking(record) => {
                let id = record.id.clone();
                if !Self::add_ticket(state, record) {
                    tracing::debug!(booking_id = %id, "Ticket already at availability ceiling");
                }
            },
            CartAction::RemoveItem { id } => Self::remove(state, &id),
            CartAction::UpdateQuantity { id, quantity } => {
                Self::update_quantity(state, &id, quantity);
            },
            CartAction::SetActiveSection(section) => state.active_section = section,
            CartAction::ClearCart => {
                state.workers_bookings.clear();
                state.events_bookings.clear();
            },
            CartAction::ShowNotification { message, severity } => {
                state.notification = Some(Notification {
                    message,
                    severity,
                    shown_at: env.clock.now(),
                });
            },
            CartAction::HideNotification => state.notification = None,
        }

        SmallVec::new()
    }
}
