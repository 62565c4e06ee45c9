//! Request and response DTOs for the HTTP API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entry::{Entry, EntryDraft, Player};
use crate::domain::foundation::DomainError;
use crate::domain::order::{DeliveryMethod, Order, OrderDraft, OrderItem, ShippingAddress};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of POST /api/entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub event: String,
    pub club_name: String,
    pub player1_name: String,
    pub player1_email: String,
    pub player1_handicap: Decimal,
    pub player2_name: String,
    pub player2_email: String,
    pub player2_handicap: Decimal,
    pub contact_phone: String,
    #[serde(default)]
    pub marketing_opt_in: bool,
}

impl CreateEntryRequest {
    /// Parses the request into a draft; an unrecognized event fails here.
    pub fn into_draft(self) -> Result<EntryDraft, DomainError> {
        Ok(EntryDraft {
            event: self.event.parse()?,
            club_name: self.club_name,
            player1: Player {
                name: self.player1_name,
                email: self.player1_email,
                handicap: self.player1_handicap,
            },
            player2: Player {
                name: self.player2_name,
                email: self.player2_email,
                handicap: self.player2_handicap,
            },
            contact_phone: self.contact_phone,
            marketing_opt_in: self.marketing_opt_in,
        })
    }
}

/// One item line in POST /api/orders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Body of POST /api/orders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub delivery_method: String,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postcode: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    /// Parses the request into a draft.
    ///
    /// Address fields are only read for shipped orders; collection orders
    /// ignore whatever the client sent, matching the public form.
    pub fn into_draft(self) -> Result<OrderDraft, DomainError> {
        let delivery_method = DeliveryMethod::parse(&self.delivery_method).map_err(|_| {
            DomainError::validation(
                "deliveryMethod",
                "must be either COLLECTION or SHIPPING",
            )
        })?;

        let shipping_address = match delivery_method {
            DeliveryMethod::Shipping => match (
                self.shipping_address,
                self.shipping_city,
                self.shipping_postcode,
            ) {
                (Some(line), Some(city), Some(postcode)) => Some(ShippingAddress {
                    line,
                    city,
                    postcode,
                }),
                _ => None,
            },
            DeliveryMethod::Collection => None,
        };

        Ok(OrderDraft {
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            delivery_method,
            shipping_address,
            notes: self.notes,
            items: self
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        })
    }
}

/// Body of POST /api/admin/orders/:id/status and entries/:id/status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// Entry representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: String,
    pub event: String,
    pub club_name: String,
    pub player1_name: String,
    pub player2_name: String,
    pub payment_status: String,
    pub entry_fee: Decimal,
    pub created_at: String,
    pub paid_at: Option<String>,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            event: entry.event.as_str().to_string(),
            club_name: entry.club_name,
            player1_name: entry.player1.name,
            player2_name: entry.player2.name,
            payment_status: entry.payment_status.as_str().to_string(),
            entry_fee: entry.entry_fee,
            created_at: entry.created_at.to_string(),
            paid_at: entry.paid_at.map(|t| t.to_string()),
        }
    }
}

/// Response of POST /api/entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryResponse {
    pub entry: EntryResponse,
    pub checkout_url: String,
}

/// Item line in an order response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Order representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub delivery_method: String,
    pub items: Vec<OrderItemResponse>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub status: String,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub fulfilled_at: Option<String>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number,
            customer_name: order.customer_name,
            delivery_method: order.delivery_method.as_str().to_string(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            subtotal: order.subtotal,
            shipping_cost: order.shipping_cost,
            total: order.total,
            status: order.status.as_str().to_string(),
            created_at: order.created_at.to_string(),
            paid_at: order.paid_at.map(|t| t.to_string()),
            fulfilled_at: order.fulfilled_at.map(|t| t.to_string()),
        }
    }
}

/// Response of POST /api/orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: OrderResponse,
    pub checkout_url: String,
}

/// Response of GET /api/orders/:order_number/status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub order_number: String,
    pub status: String,
}

/// Paid-entry count for an event.
#[derive(Debug, Clone, Serialize)]
pub struct EntryCountResponse {
    pub count: u64,
}

/// Acknowledgement body for webhook deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub outcome: &'static str,
}

/// Error body returned for every failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_request_parses_event() {
        let request: CreateEntryRequest = serde_json::from_value(json!({
            "event": "KENT",
            "clubName": "Royal Blackheath",
            "player1Name": "Alice Fairway",
            "player1Email": "alice@example.com",
            "player1Handicap": "12.1",
            "player2Name": "Bob Bunker",
            "player2Email": "bob@example.com",
            "player2Handicap": "28.0",
            "contactPhone": "07700 900123",
            "marketingOptIn": true
        }))
        .unwrap();

        let draft = request.into_draft().unwrap();
        assert_eq!(draft.event.as_str(), "KENT");
        assert_eq!(draft.player1.handicap, Decimal::new(121, 1));
        assert!(draft.marketing_opt_in);
    }

    #[test]
    fn entry_request_rejects_unknown_event() {
        let request: CreateEntryRequest = serde_json::from_value(json!({
            "event": "SURREY",
            "clubName": "X",
            "player1Name": "A",
            "player1Email": "a@example.com",
            "player1Handicap": "1.0",
            "player2Name": "B",
            "player2Email": "b@example.com",
            "player2Handicap": "2.0",
            "contactPhone": "0"
        }))
        .unwrap();

        assert!(matches!(
            request.into_draft(),
            Err(DomainError::UnknownEvent(_))
        ));
    }

    #[test]
    fn order_request_maps_shipping_address() {
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "customerName": "Carol Green",
            "customerEmail": "carol@example.com",
            "customerPhone": "07700 900456",
            "deliveryMethod": "SHIPPING",
            "shippingAddress": "1 Fairway Drive",
            "shippingCity": "Maidstone",
            "shippingPostcode": "ME14 1AA",
            "items": [
                {"productId": "cap", "productName": "Cap", "quantity": 2, "unitPrice": "10.00"}
            ]
        }))
        .unwrap();

        let draft = request.into_draft().unwrap();
        assert_eq!(draft.delivery_method, DeliveryMethod::Shipping);
        assert_eq!(draft.shipping_address.unwrap().postcode, "ME14 1AA");
        assert_eq!(draft.items.len(), 1);
    }

    #[test]
    fn collection_order_ignores_address_fields() {
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "customerName": "Carol Green",
            "customerEmail": "carol@example.com",
            "customerPhone": "07700 900456",
            "deliveryMethod": "COLLECTION",
            "shippingAddress": "1 Fairway Drive",
            "items": [
                {"productId": "cap", "productName": "Cap", "quantity": 1, "unitPrice": "10.00"}
            ]
        }))
        .unwrap();

        let draft = request.into_draft().unwrap();
        assert!(draft.shipping_address.is_none());
    }

    #[test]
    fn unknown_delivery_method_is_a_validation_error() {
        let request: CreateOrderRequest = serde_json::from_value(json!({
            "customerName": "Carol",
            "customerEmail": "carol@example.com",
            "customerPhone": "0",
            "deliveryMethod": "DRONE",
            "items": []
        }))
        .unwrap();

        assert!(matches!(
            request.into_draft(),
            Err(DomainError::Validation { .. })
        ));
    }
}
