//! Payment configuration (Stripe)

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    pub stripe_api_key: String,

    /// Stripe webhook signing secret (whsec_...).
    pub stripe_webhook_secret: String,

    /// Base URL for the Stripe API.
    pub stripe_api_base_url: String,

    /// Public site the checkout redirects return to.
    pub frontend_url: String,

    /// Timeout for outbound Stripe requests, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_api_base_url: "https://api.stripe.com".to_string(),
            frontend_url: "https://nationalninesgolf.co.uk".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl PaymentConfig {
    /// Check if using Stripe test mode.
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode.
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.frontend_url.starts_with("http://") && !self.frontend_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidFrontendUrl);
        }

        Ok(())
    }
}
