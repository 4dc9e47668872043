//! Read-side projections used at checkout.
//!
//! Neither type touches payment or persistence; they only shape the cart for
//! whoever submits the order.

use crate::types::{BookingId, CartState, LineItem, Section};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Totals for one section of the cart
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Section the totals cover
    pub section: Section,
    /// Number of bookings
    pub lines: usize,
    /// Sum of quantities
    pub units: u64,
    /// Σ price × quantity, saturating at [`Decimal::MAX`]
    pub subtotal: Decimal,
    /// Σ fees × quantity
    pub fees: Decimal,
    /// `subtotal + fees`
    pub total: Decimal,
}

impl CartSummary {
    /// Totals the bookings of `section`
    #[must_use]
    pub fn for_section(state: &CartState, section: Section) -> Self {
        state.section_items(section).fold(
            Self {
                section,
                ..Self::default()
            },
            |mut summary, item| {
                let quantity = Decimal::from(item.quantity());
                summary.lines += 1;
                summary.units += u64::from(item.quantity());
                summary.subtotal = summary
                    .subtotal
                    .saturating_add(item.price().saturating_mul(quantity));
                summary.fees = summary
                    .fees
                    .saturating_add(item.fees().saturating_mul(quantity));
                summary.total = summary.subtotal.saturating_add(summary.fees);
                summary
            },
        )
    }
}

/// Kind of item on an order line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderItemType {
    /// A booked worker
    Worker,
    /// An event ticket
    Ticket,
}

/// One line of an order, in the shape the order service stores
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Worker or ticket id
    pub item_id: BookingId,
    /// Worker or ticket
    pub item_type: OrderItemType,
    /// Worker name or event name
    pub name: String,
    /// Unit price
    pub price: Decimal,
    /// Units booked
    pub quantity: u32,
    /// Fees per unit
    pub fees: Decimal,
}

impl From<LineItem<'_>> for OrderLine {
    fn from(item: LineItem<'_>) -> Self {
        Self {
            item_id: item.id().clone(),
            item_type: match item {
                LineItem::Worker(_) => OrderItemType::Worker,
                LineItem::Ticket(_) => OrderItemType::Ticket,
            },
            name: item.name().to_string(),
            price: item.price(),
            quantity: item.quantity(),
            fees: item.fees(),
        }
    }
}

/// The active section of the cart, ready to hand to the order service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// `workers` or `events`
    pub booking_type: Section,
    /// Lines in cart order
    pub items: Vec<OrderLine>,
    /// Totals over `items`
    pub summary: CartSummary,
}

impl OrderDraft {
    /// Drafts an order from whichever section is active
    #[must_use]
    pub fn from_state(state: &CartState) -> Self {
        let section = state.active_section;
        Self {
            booking_type: section,
            items: state.section_items(section).map(OrderLine::from).collect(),
            summary: CartSummary::for_section(state, section),
        }
    }

    /// Whether there is anything to order
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::types::{TicketBooking, TicketRecord, WorkerBooking, WorkerRecord};
    use serde_json::json;

    fn state() -> CartState {
        let mut worker = WorkerBooking::from_record(
            WorkerRecord::new("w1")
                .with_full_name("Omar Said")
                .with_cost_per_hour("150"),
        );
        worker.quantity = 3;

        let mut ticket = TicketBooking::from_record(
            TicketRecord::new("t1")
                .with_event_name("Cairo Jazz Night")
                .with_ticket_price("100")
                .with_additional_fees("20")
                .with_available_tickets(4_u32),
        );
        ticket.quantity = 2;

        CartState {
            workers_bookings: vec![worker],
            events_bookings: vec![ticket],
            ..CartState::default()
        }
    }

    #[test]
    fn summary_per_section() {
        let state = state();

        let workers = CartSummary::for_section(&state, Section::Workers);
        assert_eq!(workers.lines, 1);
        assert_eq!(workers.units, 3);
        assert_eq!(workers.subtotal, Decimal::from(450));
        assert_eq!(workers.fees, Decimal::ZERO);
        assert_eq!(workers.total, Decimal::from(450));

        let events = CartSummary::for_section(&state, Section::Events);
        assert_eq!(events.subtotal, Decimal::from(200));
        assert_eq!(events.fees, Decimal::from(40));
        assert_eq!(events.total, Decimal::from(240));
    }

    #[test]
    fn empty_section_sums_to_zero() {
        let summary = CartSummary::for_section(&CartState::default(), Section::Events);
        assert_eq!(summary.section, Section::Events);
        assert_eq!(summary.lines, 0);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn draft_follows_active_section() {
        let mut state = state();
        state.active_section = Section::Events;

        let draft = OrderDraft::from_state(&state);
        assert_eq!(draft.booking_type, Section::Events);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].item_type, OrderItemType::Ticket);
        assert_eq!(draft.items[0].name, "Cairo Jazz Night");
        assert_eq!(draft.summary.total, Decimal::from(240));
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let mut worker = WorkerBooking::from_record(
            WorkerRecord::new("w1").with_cost_per_hour("50000000000000000000000000000"),
        );
        worker.quantity = 2;
        let mut ticket = TicketBooking::from_record(
            TicketRecord::new("t1")
                .with_ticket_price("70000000000000000000000000000")
                .with_additional_fees("70000000000000000000000000000")
                .with_available_tickets(3_u32),
        );
        ticket.quantity = 3;
        let state = CartState {
            workers_bookings: vec![
                worker.clone(),
                WorkerBooking {
                    id: BookingId::from("w2"),
                    ..worker
                },
            ],
            events_bookings: vec![ticket],
            ..CartState::default()
        };

        let workers = CartSummary::for_section(&state, Section::Workers);
        assert_eq!(workers.units, 4);
        assert_eq!(workers.subtotal, Decimal::MAX);
        assert_eq!(workers.total, Decimal::MAX);

        let events = CartSummary::for_section(&state, Section::Events);
        assert_eq!(events.subtotal, Decimal::MAX);
        assert_eq!(events.fees, Decimal::MAX);
        assert_eq!(events.total, Decimal::MAX);
    }

    #[test]
    fn draft_lines_use_order_field_names() {
        let draft = OrderDraft::from_state(&state());
        let line = serde_json::to_value(&draft.items[0]).unwrap();

        assert_eq!(line["itemId"], json!("w1"));
        assert_eq!(line["itemType"], json!("Worker"));
        assert_eq!(line["name"], json!("Omar Said"));
        assert_eq!(line["quantity"], json!(3));
        assert_eq!(serde_json::to_value(&draft).unwrap()["bookingType"], json!("workers"));
    }
}
