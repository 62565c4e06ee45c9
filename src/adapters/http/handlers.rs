//! HTTP handlers connecting axum routes to the application layer.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::{
    CreateEntryCommand, CreateEntryHandler, CreateOrderCommand, CreateOrderHandler,
    MarkEntryPaidCommand, MarkEntryPaidHandler, MarkOrderPaidCommand, MarkOrderPaidHandler,
    ProcessWebhookCommand, ProcessWebhookHandler, UpdateEntryStatusCommand,
    UpdateEntryStatusHandler, UpdateOrderStatusCommand, UpdateOrderStatusHandler, WebhookOutcome,
};
use crate::domain::entry::{CompetitionEvent, PaymentStatus};
use crate::domain::foundation::{DomainError, EntryId, OrderId};
use crate::domain::order::OrderStatus;
use crate::domain::pricing::Pricing;
use crate::domain::webhook::WebhookSignatureVerifier;
use crate::ports::{CheckoutGateway, EntryRepository, Notifier, OrderRepository};

use super::dto::{
    CreateEntryRequest, CreateEntryResponse, CreateOrderRequest, CreateOrderResponse,
    EntryCountResponse, EntryResponse, ErrorResponse, OrderResponse, OrderStatusResponse,
    UpdateStatusRequest, WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state: Arc-wrapped ports plus immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub entries: Arc<dyn EntryRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub verifier: WebhookSignatureVerifier,
    pub pricing: Pricing,
    pub frontend_url: String,
}

impl AppState {
    fn create_entry_handler(&self) -> CreateEntryHandler {
        CreateEntryHandler::new(
            self.entries.clone(),
            self.gateway.clone(),
            self.notifier.clone(),
            self.pricing.clone(),
            self.frontend_url.clone(),
        )
    }

    fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.orders.clone(),
            self.gateway.clone(),
            self.notifier.clone(),
            self.pricing.clone(),
            self.frontend_url.clone(),
        )
    }

    fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.verifier.clone(),
            self.entries.clone(),
            self.orders.clone(),
            self.notifier.clone(),
        )
    }

    fn mark_entry_paid_handler(&self) -> MarkEntryPaidHandler {
        MarkEntryPaidHandler::new(self.entries.clone(), self.notifier.clone())
    }

    fn mark_order_paid_handler(&self) -> MarkOrderPaidHandler {
        MarkOrderPaidHandler::new(self.orders.clone(), self.notifier.clone())
    }

    fn update_entry_status_handler(&self) -> UpdateEntryStatusHandler {
        UpdateEntryStatusHandler::new(self.entries.clone())
    }

    fn update_order_status_handler(&self) -> UpdateOrderStatusHandler {
        UpdateOrderStatusHandler::new(self.orders.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Mapping
// ════════════════════════════════════════════════════════════════════════════════

/// Domain error wrapped for HTTP mapping.
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            DomainError::Validation { .. } | DomainError::UnknownEvent(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
            }
            DomainError::DuplicateEntry { .. } => (StatusCode::CONFLICT, "DUPLICATE_ENTRY"),
            DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DomainError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            DomainError::PaymentGateway(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_GATEWAY_ERROR"),
            DomainError::OrderNumberCollision(_) | DomainError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        (status, Json(ErrorResponse::new(code, self.0.to_string()))).into_response()
    }
}

fn parse_event(raw: &str) -> Result<CompetitionEvent, ApiError> {
    raw.parse::<CompetitionEvent>().map_err(ApiError::from)
}

fn parse_entry_id(raw: &str) -> Result<EntryId, ApiError> {
    raw.parse::<EntryId>()
        .map_err(|_| ApiError(DomainError::validation("id", "must be a UUID")))
}

fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse::<OrderId>()
        .map_err(|_| ApiError(DomainError::validation("id", "must be a UUID")))
}

// ════════════════════════════════════════════════════════════════════════════════
// Entry Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/entries - submit an entry and get a checkout URL.
pub async fn create_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = request.into_draft()?;
    let result = state
        .create_entry_handler()
        .handle(CreateEntryCommand { draft })
        .await?;

    Ok(Json(CreateEntryResponse {
        entry: result.entry.into(),
        checkout_url: result.checkout_url,
    }))
}

/// GET /api/entries/:id
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_entry_id(&id)?;
    let entry = state
        .entries
        .find_by_id(&id)
        .await?
        .ok_or_else(|| DomainError::not_found("entry", id.to_string()))?;
    Ok(Json(EntryResponse::from(entry)))
}

/// GET /api/entries/event/:event
pub async fn list_entries_by_event(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = parse_event(&event)?;
    let entries = state.entries.list_by_event(event).await?;
    Ok(Json(
        entries.into_iter().map(EntryResponse::from).collect::<Vec<_>>(),
    ))
}

/// GET /api/entries/event/:event/paid - public leaderboard of paid entries.
pub async fn list_paid_entries_by_event(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = parse_event(&event)?;
    let entries = state.entries.list_paid_by_event(event).await?;
    Ok(Json(
        entries.into_iter().map(EntryResponse::from).collect::<Vec<_>>(),
    ))
}

/// GET /api/entries/event/:event/count
pub async fn count_entries_by_event(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = parse_event(&event)?;
    let count = state.entries.count_paid_by_event(event).await?;
    Ok(Json(EntryCountResponse { count }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Order Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/orders - submit an order and get a checkout URL.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = request.into_draft()?;
    let result = state
        .create_order_handler()
        .handle(CreateOrderCommand { draft })
        .await?;

    Ok(Json(CreateOrderResponse {
        order: result.order.into(),
        checkout_url: result.checkout_url,
    }))
}

/// GET /api/orders/:order_number
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .orders
        .find_by_order_number(&order_number)
        .await?
        .ok_or_else(|| DomainError::not_found("order", order_number))?;
    Ok(Json(OrderResponse::from(order)))
}

/// GET /api/orders/:order_number/status - for customer tracking.
pub async fn get_order_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .orders
        .find_by_order_number(&order_number)
        .await?
        .ok_or_else(|| DomainError::not_found("order", order_number))?;
    Ok(Json(OrderStatusResponse {
        order_number: order.order_number,
        status: order.status.as_str().to_string(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe
///
/// Takes the raw body bytes so the signature verifies over exactly what
/// was received. The response status tells the sender whether to retry:
/// 2xx processed, 4xx malformed or unauthenticated (never retried), 5xx
/// transient (retried later).
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "MISSING_SIGNATURE",
                "Stripe-Signature header is required",
            )),
        )
            .into_response();
    };

    let command = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match state.webhook_handler().handle(command).await {
        Ok(outcome) => {
            let outcome = match outcome {
                WebhookOutcome::Processed => "processed",
                WebhookOutcome::AlreadyApplied => "already_applied",
                WebhookOutcome::Ignored => "ignored",
            };
            (StatusCode::OK, Json(WebhookAckResponse { outcome })).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, retryable = err.is_retryable(), "webhook rejected");
            (
                err.status_code(),
                Json(ErrorResponse::new("WEBHOOK_ERROR", err.to_string())),
            )
                .into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/admin/entries/:id/mark-paid - record a bank transfer.
pub async fn mark_entry_paid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_entry_id(&id)?;
    let entry = state
        .mark_entry_paid_handler()
        .handle(MarkEntryPaidCommand { id })
        .await?;
    Ok(Json(EntryResponse::from(entry)))
}

/// POST /api/admin/entries/:id/status
pub async fn update_entry_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_entry_id(&id)?;
    let new_status = PaymentStatus::parse(&request.status)
        .map_err(|_| DomainError::validation("status", "unrecognized payment status"))?;
    let entry = state
        .update_entry_status_handler()
        .handle(UpdateEntryStatusCommand { id, new_status })
        .await?;
    Ok(Json(EntryResponse::from(entry)))
}

/// POST /api/admin/orders/:id/mark-paid - record a bank transfer.
pub async fn mark_order_paid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_order_id(&id)?;
    let order = state
        .mark_order_paid_handler()
        .handle(MarkOrderPaidCommand { id })
        .await?;
    Ok(Json(OrderResponse::from(order)))
}

/// POST /api/admin/orders/:id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_order_id(&id)?;
    let new_status = OrderStatus::parse(&request.status)
        .map_err(|_| DomainError::validation("status", "unrecognized order status"))?;
    let order = state
        .update_order_status_handler()
        .handle(UpdateOrderStatusCommand { id, new_status })
        .await?;
    Ok(Json(OrderResponse::from(order)))
}
