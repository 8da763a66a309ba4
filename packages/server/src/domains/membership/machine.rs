//! Membership state machine
//!
//! Pure decision logic - NO IO, only state transitions.
//!
//! ```text
//! pending ──approve──▶ company_approved ──approve──▶ admin_verified
//!    │                        │
//!    └────────reject──────────┴──────────▶ rejected
//! ```
//!
//! `admin_verified` and `rejected` are terminal.

use serde::Serialize;

use crate::domains::membership::models::MembershipStatus;

/// Something an actor asks to do to a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Approve,
    Reject,
}

impl std::fmt::Display for MembershipAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipAction::Approve => f.write_str("approve"),
            MembershipAction::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Reject on a terminal membership
    AlreadyTerminal(MembershipStatus),
    /// Any other action with no entry in the table
    Invalid {
        from: MembershipStatus,
        action: MembershipAction,
    },
}

/// The transition table. Every legal move is listed here.
const TRANSITIONS: &[(MembershipStatus, MembershipAction, MembershipStatus)] = &[
    (
        MembershipStatus::Pending,
        MembershipAction::Approve,
        MembershipStatus::CompanyApproved,
    ),
    (
        MembershipStatus::CompanyApproved,
        MembershipAction::Approve,
        MembershipStatus::AdminVerified,
    ),
    (
        MembershipStatus::Pending,
        MembershipAction::Reject,
        MembershipStatus::Rejected,
    ),
    (
        MembershipStatus::CompanyApproved,
        MembershipAction::Reject,
        MembershipStatus::Rejected,
    ),
];

/// Status reached by applying `action` in state `from`
pub fn next_status(
    from: MembershipStatus,
    action: MembershipAction,
) -> Result<MembershipStatus, TransitionError> {
    if let Some((_, _, to)) = TRANSITIONS
        .iter()
        .find(|(state, act, _)| *state == from && *act == action)
    {
        return Ok(*to);
    }

    match action {
        MembershipAction::Reject if from.is_terminal() => Err(TransitionError::AlreadyTerminal(from)),
        _ => Err(TransitionError::Invalid { from, action }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MembershipStatus::*;

    #[test]
    fn test_approve_moves_forward_one_step() {
        assert_eq!(next_status(Pending, MembershipAction::Approve), Ok(CompanyApproved));
        assert_eq!(
            next_status(CompanyApproved, MembershipAction::Approve),
            Ok(AdminVerified)
        );
    }

    #[test]
    fn test_approve_fails_from_terminal_states() {
        for from in [AdminVerified, Rejected] {
            assert_eq!(
                next_status(from, MembershipAction::Approve),
                Err(TransitionError::Invalid {
                    from,
                    action: MembershipAction::Approve
                })
            );
        }
    }

    #[test]
    fn test_reject_from_any_non_terminal_state() {
        for from in MembershipStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert_eq!(next_status(from, MembershipAction::Reject), Ok(Rejected));
        }
    }

    #[test]
    fn test_reject_on_terminal_is_already_terminal() {
        assert_eq!(
            next_status(Rejected, MembershipAction::Reject),
            Err(TransitionError::AlreadyTerminal(Rejected))
        );
        assert_eq!(
            next_status(AdminVerified, MembershipAction::Reject),
            Err(TransitionError::AlreadyTerminal(AdminVerified))
        );
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in MembershipStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for action in [MembershipAction::Approve, MembershipAction::Reject] {
                assert!(next_status(from, action).is_err());
            }
        }
    }
}
