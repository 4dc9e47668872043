//! Domain types for the cart.
//!
//! Incoming worker and ticket records keep the camelCase shape the directory
//! and ticketing services publish. Every field other than `_id` is optional and
//! amount fields accept either numbers or strings, so a sloppy record degrades
//! to defaults instead of failing to load.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Type label used when a worker has no active service-type flag
pub const DEFAULT_WORKER_LABEL: &str = "Service Provider";

/// Type label shared by every ticket booking
pub const TICKET_LABEL: &str = "Event Ticket";

/// Identifier of a worker or ticket, and of the booking made from it
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Creates a `BookingId` from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BookingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A loosely typed amount as found in upstream records
///
/// Upstream forms submit rates as text (`"500"`, `"450/hr"`) while seeded
/// listings store plain numbers. Anything else is kept so that deserializing
/// a record never fails on an amount field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A JSON number
    Number(serde_json::Number),
    /// A JSON string
    Text(String),
    /// Any other JSON value (booleans, arrays, objects)
    Other(Value),
}

impl RawAmount {
    /// Reads the amount the way a browser's `parseFloat` would: leading
    /// whitespace is skipped and the longest numeric prefix wins.
    ///
    /// Returns `None` when no numeric prefix exists. Values outside the
    /// [`Decimal`] range saturate.
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(number) => parse_numeric_prefix(&number.to_string()),
            Self::Text(text) => parse_numeric_prefix(text),
            Self::Other(_) => None,
        }
    }
}

impl From<&str> for RawAmount {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for RawAmount {
    fn from(number: i64) -> Self {
        Self::Number(number.into())
    }
}

impl From<u32> for RawAmount {
    fn from(number: u32) -> Self {
        Self::Number(number.into())
    }
}

fn take_digits(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    pos
}

fn parse_numeric_prefix(input: &str) -> Option<Decimal> {
    let text = input.trim_start();
    let bytes = text.as_bytes();

    let mut pos = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            pos = 1;
            true
        },
        Some(b'+') => {
            pos = 1;
            false
        },
        _ => false,
    };

    let int_end = take_digits(bytes, pos);
    let integer = &text[pos..int_end];
    pos = int_end;

    let mut fraction = "";
    if bytes.get(pos) == Some(&b'.') {
        let frac_end = take_digits(bytes, pos + 1);
        fraction = &text[pos + 1..frac_end];
        if !fraction.is_empty() || !integer.is_empty() {
            pos = frac_end;
        }
    }

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut literal = String::with_capacity(pos + 8);
    if negative {
        literal.push('-');
    }
    literal.push_str(if integer.is_empty() { "0" } else { integer });
    if !fraction.is_empty() {
        literal.push('.');
        literal.push_str(fraction);
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp_pos = pos + 1;
        let exp_negative = bytes.get(exp_pos) == Some(&b'-');
        if matches!(bytes.get(exp_pos), Some(b'+' | b'-')) {
            exp_pos += 1;
        }
        let exp_end = take_digits(bytes, exp_pos);
        if exp_end > exp_pos {
            literal.push('e');
            if exp_negative {
                literal.push('-');
            }
            literal.push_str(&text[exp_pos..exp_end]);
            return Decimal::from_scientific(&literal)
                .ok()
                .or_else(|| saturate(&literal));
        }
    }

    Decimal::from_str(&literal).ok().or_else(|| saturate(&literal))
}

/// Clamps a well-formed literal that does not fit a [`Decimal`]
///
/// Magnitudes past the range pin to [`Decimal::MAX`] or [`Decimal::MIN`];
/// values too small to represent round to zero.
fn saturate(literal: &str) -> Option<Decimal> {
    let value: f64 = literal.parse().ok()?;
    Some(if value.abs() < 1.0 {
        Decimal::ZERO
    } else if value.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Clamps a parsed amount to a non-negative price
fn non_negative(amount: Option<&RawAmount>) -> Decimal {
    match amount.and_then(RawAmount::to_decimal) {
        Some(value) if value > Decimal::ZERO => value,
        _ => Decimal::ZERO,
    }
}

/// JavaScript-style truthiness of a service-type flag value
fn is_active_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A worker profile as published by the worker directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    /// Worker id
    #[serde(rename = "_id")]
    pub id: BookingId,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Hourly rate, as text or number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_hour: Option<RawAmount>,
    /// Service-type flags in the order the profile lists them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_types: Option<Map<String, Value>>,
    /// Every other profile field, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkerRecord {
    /// Creates a record with only an id
    #[must_use]
    pub fn new(id: impl Into<BookingId>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            cost_per_hour: None,
            worker_types: None,
            extra: Map::new(),
        }
    }

    /// Sets the display name
    #[must_use]
    pub fn with_full_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    /// Sets the hourly rate
    #[must_use]
    pub fn with_cost_per_hour(mut self, cost: impl Into<RawAmount>) -> Self {
        self.cost_per_hour = Some(cost.into());
        self
    }

    /// Sets one service-type flag, keeping earlier flags in order
    #[must_use]
    pub fn with_worker_type(mut self, name: impl Into<String>, active: bool) -> Self {
        self.worker_types
            .get_or_insert_with(Map::new)
            .insert(name.into(), Value::Bool(active));
        self
    }

    /// Hourly rate as a price; unparseable or negative rates are free
    #[must_use]
    pub fn hourly_rate(&self) -> Decimal {
        non_negative(self.cost_per_hour.as_ref())
    }

    /// Comma-joined active service types, or [`DEFAULT_WORKER_LABEL`]
    #[must_use]
    pub fn service_label(&self) -> String {
        let active: Vec<&str> = self
            .worker_types
            .iter()
            .flat_map(|types| types.iter())
            .filter(|(_, flag)| is_active_flag(flag))
            .map(|(name, _)| name.as_str())
            .collect();

        if active.is_empty() {
            DEFAULT_WORKER_LABEL.to_string()
        } else {
            active.join(", ")
        }
    }
}

/// An event-ticket listing as published by the ticketing service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    /// Ticket id
    #[serde(rename = "_id")]
    pub id: BookingId,
    /// Event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Listed price per ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<RawAmount>,
    /// Per-ticket fees charged on top of the price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_fees: Option<RawAmount>,
    /// Tickets left for sale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tickets: Option<RawAmount>,
    /// Every other listing field, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TicketRecord {
    /// Creates a record with only an id
    #[must_use]
    pub fn new(id: impl Into<BookingId>) -> Self {
        Self {
            id: id.into(),
            event_name: None,
            ticket_price: None,
            additional_fees: None,
            available_tickets: None,
            extra: Map::new(),
        }
    }

    /// Sets the event name
    #[must_use]
    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    /// Sets the listed price
    #[must_use]
    pub fn with_ticket_price(mut self, price: impl Into<RawAmount>) -> Self {
        self.ticket_price = Some(price.into());
        self
    }

    /// Sets the per-ticket fees
    #[must_use]
    pub fn with_additional_fees(mut self, fees: impl Into<RawAmount>) -> Self {
        self.additional_fees = Some(fees.into());
        self
    }

    /// Sets the number of tickets left
    #[must_use]
    pub fn with_available_tickets(mut self, available: impl Into<RawAmount>) -> Self {
        self.available_tickets = Some(available.into());
        self
    }

    /// Listed price; unparseable or negative prices are free
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        non_negative(self.ticket_price.as_ref())
    }

    /// Per-ticket fees, 0 when absent
    #[must_use]
    pub fn fees(&self) -> Decimal {
        non_negative(self.additional_fees.as_ref())
    }

    /// How many of this ticket one cart may hold
    ///
    /// Listings always offer at least one ticket, so a missing or nonsensical
    /// count yields 1. Fractions are truncated.
    #[must_use]
    pub fn ceiling(&self) -> u32 {
        self.available_tickets
            .as_ref()
            .and_then(RawAmount::to_decimal)
            .map(|count| {
                if count >= Decimal::from(u32::MAX) {
                    u32::MAX
                } else {
                    count.trunc().to_u32().unwrap_or(0)
                }
            })
            .filter(|count| *count >= 1)
            .unwrap_or(1)
    }
}

/// Which booking collection the cart foregrounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Service-worker bookings
    #[default]
    Workers,
    /// Event-ticket bookings
    Events,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Workers => f.write_str("workers"),
            Self::Events => f.write_str("events"),
        }
    }
}

/// Severity of a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something was added
    Success,
    /// A request was rejected
    Error,
}

/// The transient message shown above the cart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Message text
    pub message: String,
    /// Success or error
    pub severity: Severity,
    /// When the message was shown
    pub shown_at: DateTime<Utc>,
}

/// A booked service worker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerBooking {
    /// Worker id
    pub id: BookingId,
    /// Hourly rate at the time the worker was added
    pub price: Decimal,
    /// Booked hours
    pub quantity: u32,
    /// Active service types
    pub type_label: String,
    /// Profile the booking was made from
    pub record: WorkerRecord,
}

impl WorkerBooking {
    /// Books one hour of the worker
    #[must_use]
    pub fn from_record(record: WorkerRecord) -> Self {
        Self {
            id: record.id.clone(),
            price: record.hourly_rate(),
            quantity: 1,
            type_label: record.service_label(),
            record,
        }
    }

    /// Display name, falling back to the id
    #[must_use]
    pub fn name(&self) -> &str {
        self.record
            .full_name
            .as_deref()
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// A booked event ticket
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketBooking {
    /// Ticket id
    pub id: BookingId,
    /// Listed price per ticket
    pub price: Decimal,
    /// Fees per ticket
    pub fees: Decimal,
    /// Tickets in the cart; never above `available_tickets`
    pub quantity: u32,
    /// Ceiling on `quantity`
    pub available_tickets: u32,
    /// Listing the booking was made from
    pub record: TicketRecord,
}

impl TicketBooking {
    /// Books one ticket from the listing
    #[must_use]
    pub fn from_record(record: TicketRecord) -> Self {
        Self {
            id: record.id.clone(),
            price: record.unit_price(),
            fees: record.fees(),
            quantity: 1,
            available_tickets: record.ceiling(),
            record,
        }
    }

    /// Event name, falling back to the id
    #[must_use]
    pub fn name(&self) -> &str {
        self.record
            .event_name
            .as_deref()
            .unwrap_or_else(|| self.id.as_str())
    }

    /// Whether the cart already holds every available ticket
    #[must_use]
    pub const fn is_at_ceiling(&self) -> bool {
        self.quantity >= self.available_tickets
    }
}

/// Borrowed view over either kind of booking
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineItem<'a> {
    /// A worker booking
    Worker(&'a WorkerBooking),
    /// A ticket booking
    Ticket(&'a TicketBooking),
}

impl<'a> LineItem<'a> {
    /// Booking id
    #[must_use]
    pub const fn id(&self) -> &'a BookingId {
        match self {
            Self::Worker(booking) => &booking.id,
            Self::Ticket(booking) => &booking.id,
        }
    }

    /// Unit price
    #[must_use]
    pub const fn price(&self) -> Decimal {
        match self {
            Self::Worker(booking) => booking.price,
            Self::Ticket(booking) => booking.price,
        }
    }

    /// Fees per unit (always 0 for workers)
    #[must_use]
    pub const fn fees(&self) -> Decimal {
        match self {
            Self::Worker(_) => Decimal::ZERO,
            Self::Ticket(booking) => booking.fees,
        }
    }

    /// Units booked
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        match self {
            Self::Worker(booking) => booking.quantity,
            Self::Ticket(booking) => booking.quantity,
        }
    }

    /// Human-readable type
    #[must_use]
    pub fn type_label(&self) -> &str {
        match self {
            Self::Worker(booking) => &booking.type_label,
            Self::Ticket(_) => TICKET_LABEL,
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Worker(booking) => booking.name(),
            Self::Ticket(booking) => booking.name(),
        }
    }

    /// `(price + fees) * quantity`, saturating at [`Decimal::MAX`]
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price()
            .saturating_add(self.fees())
            .saturating_mul(Decimal::from(self.quantity()))
    }
}

/// State of one shopping session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Worker bookings in insertion order
    pub workers_bookings: Vec<WorkerBooking>,
    /// Ticket bookings in insertion order
    pub events_bookings: Vec<TicketBooking>,
    /// Foregrounded collection
    pub active_section: Section,
    /// Message currently shown, if any
    pub notification: Option<Notification>,
}

impl CartState {
    /// Creates an empty cart showing the workers section
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a worker booking
    #[must_use]
    pub fn worker(&self, id: &BookingId) -> Option<&WorkerBooking> {
        self.workers_bookings.iter().find(|booking| &booking.id == id)
    }

    /// Looks up a ticket booking
    #[must_use]
    pub fn ticket(&self, id: &BookingId) -> Option<&TicketBooking> {
        self.events_bookings.iter().find(|booking| &booking.id == id)
    }

    /// Whether either collection holds `id`
    #[must_use]
    pub fn contains(&self, id: &BookingId) -> bool {
        self.worker(id).is_some() || self.ticket(id).is_some()
    }

    /// Whether both collections are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers_bookings.is_empty() && self.events_bookings.is_empty()
    }

    /// All bookings, workers first
    pub fn cart_items(&self) -> impl Iterator<Item = LineItem<'_>> {
        self.workers_bookings
            .iter()
            .map(LineItem::Worker)
            .chain(self.events_bookings.iter().map(LineItem::Ticket))
    }

    /// Bookings in one section
    pub fn section_items(&self, section: Section) -> Box<dyn Iterator<Item = LineItem<'_>> + '_> {
        match section {
            Section::Workers => Box::new(self.workers_bookings.iter().map(LineItem::Worker)),
            Section::Events => Box::new(self.events_bookings.iter().map(LineItem::Ticket)),
        }
    }

    /// Number of bookings across both sections
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.workers_bookings.len() + self.events_bookings.len()
    }
}
