//! Purchase-order state machine.
//!
//! ```text
//!            +--> Paid       (creates an invoice, consumes stock)
//! Pending ---+
//!            +--> Cancelled
//! ```
//!
//! Paid and Cancelled are terminal.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Pending,
    Paid,
    Cancelled,
}

impl OrderState {
    /// Row id in `order_state_types`.
    pub fn id(self) -> i32 {
        match self {
            OrderState::Pending => 1,
            OrderState::Paid => 2,
            OrderState::Cancelled => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(OrderState::Pending),
            2 => Some(OrderState::Paid),
            3 => Some(OrderState::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Paid => "paid",
            OrderState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderState::Pending)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What must happen to apply an allowed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Generate an invoice and consume stock.
    Pay,
    Cancel,
}

impl Transition {
    pub fn target(self) -> OrderState {
        match self {
            Transition::Pay => OrderState::Paid,
            Transition::Cancel => OrderState::Cancelled,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid state transition from {from} to {to}")]
    NotAllowed { from: OrderState, to: OrderState },

    #[error("Unknown order state {0}")]
    UnknownState(i32),
}

/// Decide whether `from_id -> to_id` is allowed.
pub fn plan_transition(from_id: i32, to_id: i32) -> Result<Transition, TransitionError> {
    let from = OrderState::from_id(from_id).ok_or(TransitionError::UnknownState(from_id))?;
    let to = OrderState::from_id(to_id).ok_or(TransitionError::UnknownState(to_id))?;

    match (from, to) {
        (OrderState::Pending, OrderState::Paid) => Ok(Transition::Pay),
        (OrderState::Pending, OrderState::Cancelled) => Ok(Transition::Cancel),
        _ => Err(TransitionError::NotAllowed { from, to }),
    }
}

/// Only pending orders may have their contents edited.
pub fn is_editable(state_id: i32) -> bool {
    OrderState::from_id(state_id) == Some(OrderState::Pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_be_paid_or_cancelled() {
        assert_eq!(plan_transition(1, 2), Ok(Transition::Pay));
        assert_eq!(plan_transition(1, 3), Ok(Transition::Cancel));
        assert_eq!(Transition::Pay.target(), OrderState::Paid);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [OrderState::Paid, OrderState::Cancelled] {
            assert!(from.is_terminal());
            for to in [OrderState::Pending, OrderState::Paid, OrderState::Cancelled] {
                assert_eq!(
                    plan_transition(from.id(), to.id()),
                    Err(TransitionError::NotAllowed { from, to })
                );
            }
        }
    }

    #[test]
    fn test_same_state_is_rejected() {
        let err = plan_transition(1, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from pending to pending"
        );
    }

    #[test]
    fn test_unknown_state_ids() {
        assert_eq!(plan_transition(1, 9), Err(TransitionError::UnknownState(9)));
        assert_eq!(plan_transition(0, 2), Err(TransitionError::UnknownState(0)));
    }

    #[test]
    fn test_only_pending_is_editable() {
        assert!(is_editable(1));
        assert!(!is_editable(2));
        assert!(!is_editable(3));
        assert!(!is_editable(42));
    }
}
