//! Shop order aggregate.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderStatus;
use crate::domain::foundation::{DomainError, MarkPaid, OrderId, StateMachine, Timestamp};

/// Minimum unit price accepted for an order line.
fn min_unit_price() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Individual line in a shop order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Line total: unit price times quantity.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn validate(&self, index: usize) -> Result<(), DomainError> {
        if self.product_id.trim().is_empty() || self.product_name.trim().is_empty() {
            return Err(DomainError::validation(
                format!("items[{}]", index),
                "product id and name must not be empty",
            ));
        }
        if self.quantity < 1 {
            return Err(DomainError::validation(
                format!("items[{}].quantity", index),
                "must be at least 1",
            ));
        }
        if self.unit_price < min_unit_price() {
            return Err(DomainError::validation(
                format!("items[{}].unit_price", index),
                "must be at least 0.01",
            ));
        }
        Ok(())
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    Collection,
    Shipping,
}

impl DeliveryMethod {
    /// Canonical storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Collection => "COLLECTION",
            DeliveryMethod::Shipping => "SHIPPING",
        }
    }

    /// Parses a stored value.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "COLLECTION" => Ok(DeliveryMethod::Collection),
            "SHIPPING" => Ok(DeliveryMethod::Shipping),
            other => Err(DomainError::database(format!(
                "invalid delivery method value: {}",
                other
            ))),
        }
    }
}

/// Destination address, present exactly when the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line: String,
    pub city: String,
    pub postcode: String,
}

impl ShippingAddress {
    fn validate(&self) -> Result<(), DomainError> {
        if self.line.trim().is_empty()
            || self.city.trim().is_empty()
            || self.postcode.trim().is_empty()
        {
            return Err(DomainError::validation(
                "shipping_address",
                "address line, city and postcode must all be present",
            ));
        }
        Ok(())
    }
}

/// Client-submitted order data, validated before an Order is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_method: DeliveryMethod,
    pub shipping_address: Option<ShippingAddress>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    /// Validates customer fields, item lines and the address/method pairing.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer_name", "must not be empty"));
        }
        if self.customer_email.trim().is_empty() || !self.customer_email.contains('@') {
            return Err(DomainError::validation(
                "customer_email",
                "must be a valid email address",
            ));
        }
        if self.customer_phone.trim().is_empty() {
            return Err(DomainError::validation("customer_phone", "must not be empty"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("items", "must contain at least one item"));
        }
        for (index, item) in self.items.iter().enumerate() {
            item.validate(index)?;
        }
        match (self.delivery_method, &self.shipping_address) {
            (DeliveryMethod::Shipping, None) => Err(DomainError::validation(
                "shipping_address",
                "required for shipped orders",
            )),
            (DeliveryMethod::Shipping, Some(address)) => address.validate(),
            (DeliveryMethod::Collection, Some(_)) => Err(DomainError::validation(
                "shipping_address",
                "must be absent for collection orders",
            )),
            (DeliveryMethod::Collection, None) => Ok(()),
        }
    }

    /// Sum of the line totals.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// Generates a new order number.
///
/// Unix milliseconds plus a short random suffix narrow the window for
/// concurrent collisions; the store's unique index remains the authoritative
/// guard and a collision there fails loudly rather than overwriting.
pub fn generate_order_number(now: Timestamp) -> String {
    let suffix: u16 = rand::thread_rng().gen();
    format!(
        "NN-{}-{:04X}",
        now.as_datetime().timestamp_millis(),
        suffix
    )
}

/// A shop order, tracked from submission through payment to fulfilment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Globally unique, human-referenceable order number.
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_method: DeliveryMethod,
    pub shipping_address: Option<ShippingAddress>,
    pub notes: Option<String>,
    /// Ordered item lines, owned exclusively by this order.
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
    pub fulfilled_at: Option<Timestamp>,
}

impl Order {
    /// Creates a pending order from a validated draft.
    ///
    /// Totals are derived here and nowhere else: subtotal from the lines,
    /// shipping from the caller's pricing calculation (zero for collection),
    /// total as their sum.
    pub fn create(
        draft: OrderDraft,
        shipping_cost: Decimal,
        order_number: String,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        draft.validate()?;
        let subtotal = draft.subtotal();
        Ok(Order {
            id: OrderId::new(),
            order_number,
            customer_name: draft.customer_name,
            customer_email: draft.customer_email,
            customer_phone: draft.customer_phone,
            delivery_method: draft.delivery_method,
            shipping_address: draft.shipping_address,
            notes: draft.notes,
            items: draft.items,
            subtotal,
            shipping_cost,
            total: subtotal + shipping_cost,
            status: OrderStatus::Pending,
            payment_intent_id: None,
            checkout_session_id: None,
            created_at: now,
            paid_at: None,
            fulfilled_at: None,
        })
    }

    /// Records a confirmed payment.
    ///
    /// Any state in which payment was already applied (PAID or a later
    /// fulfilment state) is a no-op, so redelivered confirmations cannot
    /// regress fulfilment. Cancelled or refunded orders fail with an
    /// invalid-transition error.
    pub fn mark_paid(
        &mut self,
        payment_intent_id: &str,
        now: Timestamp,
    ) -> Result<MarkPaid, DomainError> {
        if self.status.payment_applied() {
            return Ok(MarkPaid::AlreadyPaid);
        }
        self.status = self.status.transition_to(OrderStatus::Paid)?;
        self.payment_intent_id = Some(payment_intent_id.to_string());
        self.paid_at = Some(now);
        Ok(MarkPaid::Applied)
    }

    /// Administrative status change, validated by the state machine.
    ///
    /// Entering DELIVERED or COLLECTED records the fulfilment time.
    pub fn update_status(&mut self, new_status: OrderStatus, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(new_status)?;
        if new_status.is_fulfilment() {
            self.fulfilled_at = Some(now);
        }
        Ok(())
    }

    /// Records the checkout session created for this order (last write wins).
    pub fn set_checkout_session(&mut self, session_id: &str) {
        self.checkout_session_id = Some(session_id.to_string());
    }
}

#[cfg(test)]
pub(crate) fn test_draft(delivery_method: DeliveryMethod, items: Vec<OrderItem>) -> OrderDraft {
    OrderDraft {
        customer_name: "Carol Green".to_string(),
        customer_email: "carol@example.com".to_string(),
        customer_phone: "07700 900456".to_string(),
        delivery_method,
        shipping_address: match delivery_method {
            DeliveryMethod::Shipping => Some(ShippingAddress {
                line: "1 Fairway Drive".to_string(),
                city: "Maidstone".to_string(),
                postcode: "ME14 1AA".to_string(),
            }),
            DeliveryMethod::Collection => None,
        },
        notes: None,
        items,
    }
}

#[cfg(test)]
pub(crate) fn test_item(product_id: &str, quantity: u32, unit_price: Decimal) -> OrderItem {
    OrderItem {
        product_id: product_id.to_string(),
        product_name: format!("Product {}", product_id),
        quantity,
        unit_price,
    }
}
