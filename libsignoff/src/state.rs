//! Transition rules for the `pending | approved | rejected` state machine.

use signoff_config::RejectionPolicy;
use thiserror::Error;

use crate::model::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot transition from '{from}' to '{to}'")]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
}

/// An approver's decision is taken exactly once.
pub fn approval_transition(from: Status, to: Status) -> Result<(), InvalidTransition> {
    match (from, to) {
        (Status::Pending, Status::Approved) | (Status::Pending, Status::Rejected) => Ok(()),
        _ => Err(InvalidTransition { from, to }),
    }
}

/// Whether a task may move from `from` to `to`. Staying put is always
/// allowed; nothing ever returns to `pending`. A rejection always lands.
pub fn task_transition_allowed(from: Status, to: Status, policy: RejectionPolicy) -> bool {
    match (from, to) {
        (a, b) if a == b => true,
        (_, Status::Rejected) => true,
        (Status::Pending, Status::Approved) => true,
        (Status::Rejected, Status::Approved) => policy == RejectionPolicy::Overridable,
        _ => false,
    }
}

/// Status a task should have given its approvals and rejections.
pub fn task_status(unanimous: bool, rejected: bool, policy: RejectionPolicy) -> Status {
    match (unanimous, rejected, policy) {
        (true, false, _) => Status::Approved,
        (true, true, RejectionPolicy::Overridable) => Status::Approved,
        (_, true, _) => Status::Rejected,
        (false, false, _) => Status::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_transitions() {
        assert!(approval_transition(Status::Pending, Status::Approved).is_ok());
        assert!(approval_transition(Status::Pending, Status::Rejected).is_ok());
        for from in [Status::Approved, Status::Rejected] {
            for to in Status::ALL {
                assert_eq!(
                    approval_transition(from, to),
                    Err(InvalidTransition { from, to })
                );
            }
        }
        assert!(approval_transition(Status::Pending, Status::Pending).is_err());
    }

    #[test]
    fn test_task_never_returns_to_pending() {
        for policy in [RejectionPolicy::Overridable, RejectionPolicy::Terminal] {
            assert!(!task_transition_allowed(Status::Approved, Status::Pending, policy));
            assert!(!task_transition_allowed(Status::Rejected, Status::Pending, policy));
            assert!(task_transition_allowed(Status::Approved, Status::Rejected, policy));
        }
    }

    #[test]
    fn test_rejected_to_approved_depends_on_policy() {
        assert!(task_transition_allowed(
            Status::Rejected,
            Status::Approved,
            RejectionPolicy::Overridable
        ));
        assert!(!task_transition_allowed(
            Status::Rejected,
            Status::Approved,
            RejectionPolicy::Terminal
        ));
    }

    #[test]
    fn test_task_status() {
        let o = RejectionPolicy::Overridable;
        let t = RejectionPolicy::Terminal;
        assert_eq!(task_status(false, false, o), Status::Pending);
        assert_eq!(task_status(true, false, t), Status::Approved);
        assert_eq!(task_status(false, true, o), Status::Rejected);
        assert_eq!(task_status(true, true, o), Status::Approved);
        assert_eq!(task_status(true, true, t), Status::Rejected);
    }
}
