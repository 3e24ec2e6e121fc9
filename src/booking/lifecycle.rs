//! Booking status machine.
//!
//! pending -> confirmed -> completed, with cancellation allowed from pending
//! or confirmed. Re-applying the current terminal-ish status is a no-op so
//! retried cancels and payment callbacks succeed.

use crate::models::BookingStatus;

use super::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status must be written
    Apply,
    /// Booking is already in the target status
    Unchanged,
}

impl BookingStatus {
    pub fn transition_to(self, target: BookingStatus) -> Result<Transition, BookingError> {
        use BookingStatus::*;

        match (self, target) {
            (Confirmed, Confirmed) | (Cancelled, Cancelled) | (Completed, Completed) => {
                Ok(Transition::Unchanged)
            }
            (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Cancelled)
            | (Confirmed, Completed) => Ok(Transition::Apply),
            (from, to) => Err(BookingError::InvalidTransition { from, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert_eq!(Pending.transition_to(Confirmed).unwrap(), Transition::Apply);
        assert_eq!(Pending.transition_to(Cancelled).unwrap(), Transition::Apply);
        assert_eq!(Confirmed.transition_to(Cancelled).unwrap(), Transition::Apply);
        assert_eq!(Confirmed.transition_to(Completed).unwrap(), Transition::Apply);
    }

    #[test]
    fn test_repeated_transitions_are_no_ops() {
        assert_eq!(Cancelled.transition_to(Cancelled).unwrap(), Transition::Unchanged);
        assert_eq!(Confirmed.transition_to(Confirmed).unwrap(), Transition::Unchanged);
        assert_eq!(Completed.transition_to(Completed).unwrap(), Transition::Unchanged);
    }

    #[test]
    fn test_rejected_transitions() {
        for (from, to) in [
            (Pending, Pending),
            (Pending, Completed),
            (Cancelled, Confirmed),
            (Cancelled, Pending),
            (Completed, Cancelled),
            (Completed, Pending),
            (Confirmed, Pending),
        ] {
            match from.transition_to(to) {
                Err(BookingError::InvalidTransition { from: f, to: t }) => {
                    assert_eq!((f, t), (from, to));
                }
                other => panic!("{from} -> {to} should be rejected, got {other:?}"),
            }
        }
    }
}
