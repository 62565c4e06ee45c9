//! Configuration error types.

use thiserror::Error;

/// Failure to load configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Semantic validation failure of loaded configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required configuration: {0}")]
    MissingRequired(&'static str),

    #[error("server port must not be 0")]
    InvalidPort,

    #[error("database url must start with postgres://")]
    InvalidDatabaseUrl,

    #[error("Stripe API key must start with sk_")]
    InvalidStripeKey,

    #[error("Stripe webhook secret must start with whsec_")]
    InvalidStripeWebhookSecret,

    #[error("frontend url must start with http:// or https://")]
    InvalidFrontendUrl,

    #[error("pricing amounts must not be negative")]
    NegativeAmount,

    #[error("shipping thresholds must be strictly increasing")]
    ShippingThresholdsOutOfOrder,
}
