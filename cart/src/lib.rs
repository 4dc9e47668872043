//! # Bazaar Cart
//!
//! Shopping cart for a local-services marketplace. A shopper books service
//! workers by the hour and buys event tickets; the cart keeps both kinds of
//! booking, remembers which section is in front, and shows short-lived
//! notifications.
//!
//! # Architecture
//!
//! ```text
//! storefront ──► Cart (api) ──► Store ──► CartReducer
//!                   │              │
//!                   │ pre-checks   └── cancellable auto-hide timer
//!                   └─ notifications
//! ```
//!
//! - [`CartReducer`] is the pure state machine over [`CartState`].
//! - [`Cart`] wraps the runtime store, rejects ticket requests past
//!   availability and schedules the notification auto-hide.
//! - [`checkout`] turns the cart into totals and an order draft.
//!
//! # Quick Start
//!
//! ```no_run
//! use bazaar_cart::{Cart, CartConfig, TicketRecord, WorkerRecord};
//! use bazaar_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), bazaar_cart::CartError> {
//! let cart = Cart::new(&CartConfig::from_env(), Arc::new(SystemClock))?;
//!
//! cart.add_worker(
//!     WorkerRecord::new("w1")
//!         .with_cost_per_hour("500")
//!         .with_worker_type("plumber", true),
//! )
//! .await?;
//!
//! let added = cart
//!     .add_ticket(TicketRecord::new("t1").with_ticket_price("100").with_available_tickets(2_u32))
//!     .await?;
//! assert!(added);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod reducer;
pub mod types;

pub use api::{messages, Cart, CartStore, NOTIFICATION_TIMER};
pub use checkout::{CartSummary, OrderDraft, OrderItemType, OrderLine};
pub use config::CartConfig;
pub use error::{CartError, Result};
pub use reducer::{CartAction, CartEnvironment, CartReducer};
pub use types::{
    BookingId, CartState, LineItem, Notification, RawAmount, Section, Severity, TicketBooking,
    TicketRecord, WorkerBooking, WorkerRecord,
};
