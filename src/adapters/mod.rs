//! Adapters: implementations of the ports against real infrastructure.

pub mod http;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod stripe;
