//! HTTP boundary: axum routes, request/response DTOs and error mapping.

mod dto;
mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::api_router;
