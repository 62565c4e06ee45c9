//! Shared domain building blocks: errors, identifiers, time, state machines.

mod errors;
mod ids;
mod outcome;
mod state_machine;
mod timestamp;

pub use errors::DomainError;
pub use ids::{EntryId, OrderId};
pub use outcome::MarkPaid;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
