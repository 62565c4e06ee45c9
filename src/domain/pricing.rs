//! Entry fee and shipping cost rules.
//!
//! All amounts come from an immutable [`PricingConfig`] handed to the
//! calculator at construction; there is no process-wide pricing state and
//! no side effects.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::entry::CompetitionEvent;
use super::order::DeliveryMethod;

/// Pricing constants for entry fees and shipping tiers.
///
/// Defaults match the published fees: Kent Nines £150, Essex Nines £50,
/// and UK shipping at £5 / £10 / £15 tiered on the order subtotal with
/// thresholds at £30 and £75.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub kent_entry_fee: Decimal,
    pub essex_entry_fee: Decimal,
    pub shipping_small: Decimal,
    pub shipping_medium: Decimal,
    pub shipping_large: Decimal,
    /// Subtotals at or above this amount pay the medium rate.
    pub shipping_medium_threshold: Decimal,
    /// Subtotals at or above this amount pay the large rate.
    pub shipping_large_threshold: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            kent_entry_fee: Decimal::new(15000, 2),
            essex_entry_fee: Decimal::new(5000, 2),
            shipping_small: Decimal::new(500, 2),
            shipping_medium: Decimal::new(1000, 2),
            shipping_large: Decimal::new(1500, 2),
            shipping_medium_threshold: Decimal::new(3000, 2),
            shipping_large_threshold: Decimal::new(7500, 2),
        }
    }
}

/// Pure fee and shipping calculator.
#[derive(Debug, Clone)]
pub struct Pricing {
    config: PricingConfig,
}

impl Pricing {
    /// Creates a calculator over the given constants.
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Fixed entry fee for a competition.
    ///
    /// Unrecognized events are unrepresentable here; parsing an unknown
    /// event string fails earlier with `DomainError::UnknownEvent`.
    pub fn entry_fee(&self, event: CompetitionEvent) -> Decimal {
        match event {
            CompetitionEvent::Kent => self.config.kent_entry_fee,
            CompetitionEvent::Essex => self.config.essex_entry_fee,
        }
    }

    /// Shipping cost for a delivery method and order subtotal.
    ///
    /// Collection is always free. Shipped orders are tiered on half-open
    /// subtotal intervals: [0, medium) small, [medium, large) medium,
    /// [large, ∞) large.
    pub fn shipping_cost(&self, method: DeliveryMethod, subtotal: Decimal) -> Decimal {
        match method {
            DeliveryMethod::Collection => Decimal::ZERO,
            DeliveryMethod::Shipping => {
                if subtotal < self.config.shipping_medium_threshold {
                    self.config.shipping_small
                } else if subtotal < self.config.shipping_large_threshold {
                    self.config.shipping_medium
                } else {
                    self.config.shipping_large
                }
            }
        }
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}
