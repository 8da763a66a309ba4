//! Transition guard - who may do what to a membership.
//!
//! Pure functions over a membership and the caller's [`Standing`]. Lookups
//! needed to compute the standing (page ownership) happen in the activities.

use crate::common::{MembershipId, PageId};
use crate::domains::membership::error::{MembershipError, MembershipResult};
use crate::domains::membership::machine::{next_status, MembershipAction};
use crate::domains::membership::models::{
    InitiatedBy, Membership, MembershipStatus, Subject, UploaderParty,
};

/// How the actor relates to one membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standing {
    /// Actor is the subject user, or owns the subject page
    pub subject_side: bool,
    /// Actor owns the target company page
    pub company_side: bool,
    /// Actor is a platform admin
    pub admin: bool,
}

impl Standing {
    pub fn is_involved(&self) -> bool {
        self.subject_side || self.company_side
    }

    fn may_see(&self) -> bool {
        self.is_involved() || self.admin
    }

    /// Party recorded on documents this actor uploads
    pub fn uploader(&self) -> Option<UploaderParty> {
        if self.subject_side {
            Some(UploaderParty::Subject)
        } else if self.company_side {
            Some(UploaderParty::Company)
        } else if self.admin {
            Some(UploaderParty::Admin)
        } else {
            None
        }
    }
}

/// A checked status change, ready to be applied with a compare-and-set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub membership_id: MembershipId,
    pub action: MembershipAction,
    pub from: MembershipStatus,
    pub to: MembershipStatus,
}

pub struct TransitionGuard;

impl TransitionGuard {
    /// May the actor create a membership for `subject` at `page_id`?
    pub fn check_request(
        subject: Subject,
        page_id: PageId,
        initiated_by: InitiatedBy,
        standing: &Standing,
    ) -> MembershipResult<()> {
        match initiated_by {
            InitiatedBy::Subject if !standing.subject_side => {
                return Err(MembershipError::forbidden(
                    "You can only request memberships for yourself or pages you own",
                ));
            }
            InitiatedBy::Company if !standing.company_side => {
                return Err(MembershipError::forbidden(
                    "Only the owner of the company page can propose members",
                ));
            }
            _ => {}
        }

        if subject == Subject::Page(page_id) {
            return Err(MembershipError::validation(
                "company_id",
                "A page cannot be a member of itself.",
            ));
        }

        Ok(())
    }

    /// Validate `action` against the transition table and the actor's role.
    pub fn check_transition(
        membership: &Membership,
        action: MembershipAction,
        standing: &Standing,
    ) -> MembershipResult<Transition> {
        if !standing.may_see() {
            return Err(MembershipError::forbidden(
                "You are not a party to this membership",
            ));
        }

        let to = next_status(membership.status, action)?;

        match (action, membership.status) {
            (MembershipAction::Approve, MembershipStatus::Pending) => {
                let counterparty = match membership.initiated_by {
                    InitiatedBy::Subject => standing.company_side,
                    InitiatedBy::Company => standing.subject_side,
                };
                if !counterparty {
                    return Err(MembershipError::forbidden(match membership.initiated_by {
                        InitiatedBy::Subject => {
                            "Only the company page owner can approve this request"
                        }
                        InitiatedBy::Company => "Only the invited member can accept this invitation",
                    }));
                }
            }
            (MembershipAction::Approve, _) => {
                if !standing.admin {
                    return Err(MembershipError::forbidden("Admin access required"));
                }
            }
            (MembershipAction::Reject, _) => {}
        }

        Ok(Transition {
            membership_id: membership.id,
            action,
            from: membership.status,
            to,
        })
    }

    /// May the actor attach a document? Returns the party to record.
    pub fn check_attach(membership: &Membership, standing: &Standing) -> MembershipResult<UploaderParty> {
        let party = standing.uploader().ok_or_else(|| {
            MembershipError::forbidden("You are not a party to this membership")
        })?;

        if membership.status == MembershipStatus::Rejected {
            return Err(MembershipError::AlreadyTerminal(membership.status));
        }

        Ok(party)
    }

    /// May the actor edit the claimed position?
    pub fn check_edit(membership: &Membership, standing: &Standing) -> MembershipResult<()> {
        if !(standing.subject_side || standing.admin) {
            return Err(MembershipError::forbidden(
                "Only the member can edit this membership",
            ));
        }

        if membership.status.is_terminal() {
            return Err(MembershipError::AlreadyTerminal(membership.status));
        }

        Ok(())
    }

    /// May the actor withdraw (delete) their own pending request?
    pub fn check_cancel(membership: &Membership, standing: &Standing) -> MembershipResult<()> {
        if !standing.subject_side || membership.initiated_by != InitiatedBy::Subject {
            return Err(MembershipError::forbidden(
                "Only the requester can cancel this membership request",
            ));
        }

        if membership.status != MembershipStatus::Pending {
            return Err(MembershipError::conflict(format!(
                "Only pending requests can be cancelled, this one is {}",
                membership.status
            )));
        }

        Ok(())
    }

    /// May the actor delete the membership outright?
    pub fn check_remove(_membership: &Membership, standing: &Standing) -> MembershipResult<()> {
        if !standing.may_see() {
            return Err(MembershipError::forbidden(
                "Only the page owner or the member can remove this membership",
            ));
        }
        Ok(())
    }

    /// May the actor read the membership and its documents?
    pub fn check_view(_membership: &Membership, standing: &Standing) -> MembershipResult<()> {
        if !standing.may_see() {
            return Err(MembershipError::forbidden(
                "You are not a party to this membership",
            ));
        }
        Ok(())
    }
}
