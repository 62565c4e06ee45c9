//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `NINES_API` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use nines_api::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::ServerConfig;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::pricing::PricingConfig;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,

    /// Entry fee and shipping constants
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `NINES_API` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `NINES_API__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `NINES_API__DATABASE__URL=...` -> `database.url = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("NINES_API")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.validate_pricing()?;
        Ok(())
    }

    fn validate_pricing(&self) -> Result<(), ValidationError> {
        let p = &self.pricing;
        let amounts = [
            p.kent_entry_fee,
            p.essex_entry_fee,
            p.shipping_small,
            p.shipping_medium,
            p.shipping_large,
        ];
        if amounts.iter().any(|a| *a < Decimal::ZERO) {
            return Err(ValidationError::NegativeAmount);
        }
        if p.shipping_medium_threshold >= p.shipping_large_threshold {
            return Err(ValidationError::ShippingThresholdsOutOfOrder);
        }
        Ok(())
    }
}
