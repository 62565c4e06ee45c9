//! Notification adapters.

mod stub_notifier;

pub use stub_notifier::StubNotifier;
