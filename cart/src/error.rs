//! Error types for the cart.
//!
//! Rejected bookings are not errors: the cart reports them with a
//! notification and a `false` return. Only infrastructure failures surface
//! here.

use bazaar_runtime::StoreError;
use thiserror::Error;

/// Errors returned by [`crate::Cart`]
#[derive(Error, Debug)]
pub enum CartError {
    /// The underlying store refused or failed the operation
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A configuration value is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for cart operations
pub type Result<T> = std::result::Result<T, CartError>;
