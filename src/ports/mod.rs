//! Ports: contracts between the application core and the outside world.

mod checkout_gateway;
mod entry_repository;
mod notifier;
mod order_repository;

pub use checkout_gateway::{CheckoutGateway, CheckoutSession, PaymentGatewayError};
pub use entry_repository::EntryRepository;
pub use notifier::{NotifyError, Notifier};
pub use order_repository::OrderRepository;
