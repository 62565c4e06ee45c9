//! Outcome of an idempotent mark-paid transition.

/// Result of applying a paid transition to a payable entity.
///
/// Redelivered notifications make `AlreadyPaid` a normal outcome, not an
/// error: the observable end state is identical and no side effects may be
/// repeated for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaid {
    /// The entity moved to its paid state; side effects should fire once.
    Applied,
    /// The entity was already paid; nothing changed.
    AlreadyPaid,
}

impl MarkPaid {
    /// Returns true when this call performed the transition.
    pub fn was_applied(&self) -> bool {
        matches!(self, MarkPaid::Applied)
    }
}
