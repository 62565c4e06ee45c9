//! Hosted checkout session requests built from payable entities.
//!
//! Each payable component becomes one line item: an entry yields a single
//! line at the fixed fee; an order yields one line per item plus a synthetic
//! shipping line when shipping is charged. Correlation metadata ties the
//! session back to the entity for webhook resolution.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::entry::Entry;
use super::foundation::DomainError;
use super::order::Order;

/// Settlement currency for every session.
pub const CURRENCY: &str = "gbp";

/// Metadata key carrying the payable type ("entry" or "order").
pub const META_TYPE: &str = "type";
/// Metadata key carrying the entity's internal id.
pub const META_INTERNAL_ID: &str = "internal_id";
/// Metadata key carrying the secondary lookup key (event or order number).
pub const META_SECONDARY_KEY: &str = "secondary_key";

/// Which kind of payable entity a checkout session settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayableType {
    Entry,
    Order,
}

impl PayableType {
    /// Metadata value for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayableType::Entry => "entry",
            PayableType::Order => "order",
        }
    }

    /// Parses a metadata value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(PayableType::Entry),
            "order" => Some(PayableType::Order),
            _ => None,
        }
    }
}

/// Correlation metadata attached to every session, enabling unambiguous
/// resolution of the paying entity when the webhook arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationMetadata {
    pub payable_type: PayableType,
    pub internal_id: String,
    pub secondary_key: String,
}

/// One line on the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    /// Price in minor currency units (pence).
    pub unit_amount_minor: i64,
}

/// Everything the gateway needs to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub customer_email: String,
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: CorrelationMetadata,
}

/// Converts a decimal pound amount to pence.
fn to_minor_units(amount: Decimal, field: &'static str) -> Result<i64, DomainError> {
    (amount * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or_else(|| DomainError::validation(field, "amount out of range for checkout"))
}

/// Builds the checkout session request for a competition entry.
pub fn entry_checkout_request(
    entry: &Entry,
    frontend_url: &str,
) -> Result<CheckoutSessionRequest, DomainError> {
    let event = entry.event;
    Ok(CheckoutSessionRequest {
        customer_email: entry.player1.email.clone(),
        line_items: vec![LineItem {
            name: format!("{} Entry", event.display_name()),
            description: Some(format!(
                "Pair entry: {} & {} ({})",
                entry.player1.name, entry.player2.name, entry.club_name
            )),
            quantity: 1,
            unit_amount_minor: to_minor_units(entry.entry_fee, "entry_fee")?,
        }],
        success_url: format!(
            "{}/events/{}?entered=true&session_id={{CHECKOUT_SESSION_ID}}",
            frontend_url,
            event.slug()
        ),
        cancel_url: format!("{}/events/{}#enter", frontend_url, event.slug()),
        metadata: CorrelationMetadata {
            payable_type: PayableType::Entry,
            internal_id: entry.id.to_string(),
            secondary_key: event.as_str().to_string(),
        },
    })
}

/// Builds the checkout session request for a shop order.
pub fn order_checkout_request(
    order: &Order,
    frontend_url: &str,
) -> Result<CheckoutSessionRequest, DomainError> {
    let mut line_items = Vec::with_capacity(order.items.len() + 1);
    for item in &order.items {
        line_items.push(LineItem {
            name: item.product_name.clone(),
            description: None,
            quantity: item.quantity,
            unit_amount_minor: to_minor_units(item.unit_price, "unit_price")?,
        });
    }
    if order.shipping_cost > Decimal::ZERO {
        line_items.push(LineItem {
            name: "UK Shipping".to_string(),
            description: None,
            quantity: 1,
            unit_amount_minor: to_minor_units(order.shipping_cost, "shipping_cost")?,
        });
    }

    Ok(CheckoutSessionRequest {
        customer_email: order.customer_email.clone(),
        line_items,
        success_url: format!(
            "{}/cart?success=true&order={}",
            frontend_url, order.order_number
        ),
        cancel_url: format!("{}/cart", frontend_url),
        metadata: CorrelationMetadata {
            payable_type: PayableType::Order,
            internal_id: order.id.to_string(),
            secondary_key: order.order_number.clone(),
        },
    })
}
