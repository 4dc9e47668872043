//! Property tests for the cart reducer over arbitrary action sequences.

#![allow(clippy::unwrap_used)] // Test code

use bazaar_cart::{
    BookingId, CartAction, CartEnvironment, CartReducer, CartState, Section, TicketRecord,
    WorkerRecord,
};
use bazaar_core::reducer::Reducer;
use bazaar_testing::test_clock;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const IDS: [&str; 4] = ["a", "b", "c", "d"];

fn action() -> impl Strategy<Value = CartAction> {
    let id = prop::sample::select(IDS.to_vec());

    prop_oneof![
        id.clone().prop_map(|id| {
            CartAction::AddWorkerBooking(WorkerRecord::new(id).with_cost_per_hour("120"))
        }),
        (id.clone(), 0_u32..5).prop_map(|(id, available)| {
            CartAction::AddTicketBooking(
                TicketRecord::new(id)
                    .with_ticket_price("50")
                    .with_available_tickets(available),
            )
        }),
        id.clone().prop_map(|id| CartAction::RemoveItem { id: BookingId::from(id) }),
        (id, -3_i64..8).prop_map(|(id, quantity)| CartAction::UpdateQuantity {
            id: BookingId::from(id),
            quantity,
        }),
        prop_oneof![Just(Section::Workers), Just(Section::Events)]
            .prop_map(CartAction::SetActiveSection),
        Just(CartAction::ClearCart),
    ]
}

fn unique<'a>(mut ids: impl Iterator<Item = &'a BookingId>) -> bool {
    let mut seen = HashSet::new();
    ids.all(|id| seen.insert(id))
}

proptest! {
    #[test]
    fn bookings_stay_unique_and_within_ceiling(actions in prop::collection::vec(action(), 0..60)) {
        let reducer = CartReducer::new();
        let env = CartEnvironment::new(Arc::new(test_clock()));
        let mut state = CartState::new();

        for action in actions {
            let before = state.clone();
            let rejected_ticket = match &action {
                CartAction::AddTicketBooking(record) => before
                    .ticket(&record.id)
                    .is_some_and(|booking| booking.quantity >= record.ceiling()),
                _ => false,
            };
            let clears = action == CartAction::ClearCart;

            let effects = reducer.reduce(&mut state, action, &env);
            prop_assert!(effects.is_empty());

            prop_assert!(unique(state.workers_bookings.iter().map(|b| &b.id)));
            prop_assert!(unique(state.events_bookings.iter().map(|b| &b.id)));
            for booking in &state.workers_bookings {
                prop_assert!(booking.quantity >= 1);
            }
            for booking in &state.events_bookings {
                prop_assert!(booking.quantity >= 1);
                prop_assert!(booking.quantity <= booking.available_tickets);
            }

            if rejected_ticket {
                prop_assert_eq!(&state, &before);
            }
            if clears {
                prop_assert!(state.is_empty());
                prop_assert_eq!(state.active_section, before.active_section);
            }
        }
    }

    #[test]
    fn remove_deletes_from_both_sections(id in prop::sample::select(IDS.to_vec())) {
        let reducer = CartReducer::new();
        let env = CartEnvironment::new(Arc::new(test_clock()));
        let mut state = CartState::new();

        for action in [
            CartAction::AddWorkerBooking(WorkerRecord::new(id)),
            CartAction::AddTicketBooking(TicketRecord::new(id)),
            CartAction::RemoveItem { id: BookingId::from(id) },
        ] {
            reducer.reduce(&mut state, action, &env);
        }

        prop_assert!(!state.contains(&BookingId::from(id)));
    }
}
