//! Cart demo binary
//!
//! Walks one shopping session through the cart: booking workers and
//! tickets, hitting a ticket's availability, and watching the notification
//! hide itself.

use bazaar_cart::{Cart, CartAction, CartConfig, Section, TicketRecord, WorkerRecord};
use bazaar_core::environment::SystemClock;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = CartConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(?config, "Starting cart demo");

    let cart = Cart::new(&config, Arc::new(SystemClock))?;
    let mut applied = cart.subscribe();

    println!("=== Bazaar Cart ===\n");

    let plumber: WorkerRecord = serde_json::from_value(json!({
        "_id": "w1",
        "fullName": "Omar Said",
        "costPerHour": "500",
        "workerTypes": { "plumber": true, "electrician": false },
        "mobileNumber": "0100 000 0000",
    }))?;

    println!(">>> Booking {} twice", plumber.full_name.as_deref().unwrap_or("worker"));
    cart.add_worker(plumber.clone()).await?;
    cart.add_worker(plumber).await?;
    for booking in cart.workers_bookings().await {
        println!(
            "    {} [{}] x{} @ {}",
            booking.name(),
            booking.type_label,
            booking.quantity,
            booking.price
        );
    }

    let concert: TicketRecord = serde_json::from_value(json!({
        "_id": "t1",
        "eventName": "Cairo Jazz Night",
        "ticketPrice": "100",
        "additionalFees": "20",
        "availableTickets": 2,
    }))?;

    println!("\n>>> Buying three tickets for a listing with two left");
    for attempt in 1..=3 {
        let added = cart.add_ticket(concert.clone()).await?;
        let message = cart
            .notification()
            .await
            .map(|n| n.message)
            .unwrap_or_default();
        println!("    attempt {attempt}: added={added} ({message})");
    }

    println!("\n>>> Asking for 5 tickets");
    let accepted = cart.update_quantity("t1", 5).await?;
    println!("    accepted={accepted}");

    cart.set_active_section(Section::Events).await?;
    let draft = cart.order_draft().await;
    println!("\n>>> Order draft");
    println!("{}", serde_json::to_string_pretty(&draft)?);

    println!("\n>>> Waiting for the notification to hide");
    loop {
        match applied.recv().await {
            Ok(CartAction::HideNotification) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {},
            Err(error @ RecvError::Closed) => {
                tracing::warn!(%error, "Action stream ended");
                break;
            },
        }
    }
    println!("    notification: {:?}", cart.notification().await);

    println!("\n>>> Total items in cart: {}", cart.item_count().await);
    cart.shutdown().await?;
    tracing::info!("Cart demo finished");

    Ok(())
}
