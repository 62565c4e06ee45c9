//! Stripe checkout gateway.
//!
//! Posts form-encoded session requests to `/v1/checkout/sessions` with
//! basic auth, the way the Stripe API expects. Requests carry a timeout;
//! exceeding it surfaces as a gateway error and the user re-initiates.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::checkout::{
    CheckoutSessionRequest, CURRENCY, META_INTERNAL_ID, META_SECONDARY_KEY, META_TYPE,
};
use crate::ports::{CheckoutGateway, CheckoutSession, PaymentGatewayError};

/// Stripe checkout gateway configuration.
#[derive(Clone)]
pub struct StripeGatewayConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    pub api_key: SecretString,

    /// Base URL for the Stripe API.
    pub api_base_url: String,

    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl StripeGatewayConfig {
    /// Creates a configuration with the production API base and a 30s
    /// request timeout.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: "https://api.stripe.com".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Checkout session response fields this adapter reads.
#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    url: Option<String>,
}

/// Stripe implementation of the checkout gateway port.
pub struct StripeCheckoutGateway {
    config: StripeGatewayConfig,
    http_client: reqwest::Client,
}

impl StripeCheckoutGateway {
    /// Creates a new gateway with the given configuration.
    pub fn new(config: StripeGatewayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            config,
            http_client,
        }
    }

    /// Flattens a session request into Stripe's form-encoded parameters.
    fn form_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];

        for (i, line) in request.line_items.iter().enumerate() {
            params.push((
                format!("line_items[{}][quantity]", i),
                line.quantity.to_string(),
            ));
            params.push((
                format!("line_items[{}][price_data][currency]", i),
                CURRENCY.to_string(),
            ));
            params.push((
                format!("line_items[{}][price_data][unit_amount]", i),
                line.unit_amount_minor.to_string(),
            ));
            params.push((
                format!("line_items[{}][price_data][product_data][name]", i),
                line.name.clone(),
            ));
            if let Some(description) = &line.description {
                params.push((
                    format!("line_items[{}][price_data][product_data][description]", i),
                    description.clone(),
                ));
            }
        }

        params.push((
            format!("metadata[{}]", META_TYPE),
            request.metadata.payable_type.as_str().to_string(),
        ));
        params.push((
            format!("metadata[{}]", META_INTERNAL_ID),
            request.metadata.internal_id.clone(),
        ));
        params.push((
            format!("metadata[{}]", META_SECONDARY_KEY),
            request.metadata.secondary_key.clone(),
        ));

        params
    }
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutGateway {
    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let params = Self::form_params(&request);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "checkout session request failed");
                PaymentGatewayError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "Stripe rejected checkout session");
            return Err(if status.is_server_error() {
                PaymentGatewayError::network(format!("Stripe API error: {}", error_text))
            } else {
                PaymentGatewayError::rejected(format!("Stripe API error: {}", error_text))
            });
        }

        let session: StripeSessionResponse = response.json().await.map_err(|e| {
            PaymentGatewayError::rejected(format!("failed to parse Stripe response: {}", e))
        })?;

        let redirect_url = session
            .url
            .unwrap_or_else(|| format!("https://checkout.stripe.com/c/pay/{}", session.id));

        tracing::info!(
            session_id = %session.id,
            payable_type = request.metadata.payable_type.as_str(),
            internal_id = %request.metadata.internal_id,
            "created Stripe checkout session"
        );

        Ok(CheckoutSession {
            id: session.id,
            url: redirect_url,
        })
    }
}
