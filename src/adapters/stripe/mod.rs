//! Stripe adapter: hosted checkout session creation over the Stripe API.

mod gateway;

pub use gateway::{StripeCheckoutGateway, StripeGatewayConfig};
