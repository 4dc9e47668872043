//! Configuration management for the cart.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{CartError, Result};
use bazaar_runtime::StoreConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Cart configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    /// How long a notification stays up, in milliseconds (default: 3000)
    pub notification_ttl_ms: u64,
    /// How long shutdown waits for running effects, in milliseconds (default: 5000)
    pub shutdown_timeout_ms: u64,
    /// Buffer size of the action broadcast channel (default: 16)
    pub broadcast_capacity: usize,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            notification_ttl_ms: 3000,
            shutdown_timeout_ms: 5000,
            broadcast_capacity: 16,
            log_filter: "bazaar_cart=info".to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from the process environment
    ///
    /// Environment variables:
    /// - `CART_NOTIFICATION_TTL_MS`: notification auto-hide delay
    /// - `CART_SHUTDOWN_TIMEOUT_MS`: shutdown drain timeout
    /// - `CART_BROADCAST_CAPACITY`: action broadcast buffer
    /// - `RUST_LOG`: log filter
    ///
    /// Unset or malformed values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            notification_ttl_ms: lookup("CART_NOTIFICATION_TTL_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.notification_ttl_ms),
            shutdown_timeout_ms: lookup("CART_SHUTDOWN_TIMEOUT_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.shutdown_timeout_ms),
            broadcast_capacity: lookup("CART_BROADCAST_CAPACITY")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.broadcast_capacity),
            log_filter: lookup("RUST_LOG")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }

    /// Check that the values can drive a cart
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidConfig`] for a zero notification TTL or a
    /// zero broadcast capacity.
    pub fn validate(&self) -> Result<()> {
        if self.notification_ttl_ms == 0 {
            return Err(CartError::InvalidConfig(
                "CART_NOTIFICATION_TTL_MS must be greater than zero".to_string(),
            ));
        }

        if self.broadcast_capacity == 0 {
            return Err(CartError::InvalidConfig(
                "CART_BROADCAST_CAPACITY must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Notification auto-hide delay
    #[must_use]
    pub const fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// Shutdown drain timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Store settings derived from this configuration
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(self.broadcast_capacity)
            .with_shutdown_timeout(self.shutdown_timeout())
    }
}
