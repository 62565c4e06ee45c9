//! National Nines API - entries, shop orders and payment reconciliation.
//!
//! This crate takes paid competition entries and merchandise orders, creates
//! hosted Stripe checkout sessions for them, and reconciles payment status
//! from asynchronous, at-least-once webhook deliveries.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
