//! Status changes

use super::{apply, load, standing_for};
use crate::common::{Actor, MembershipId, PageId};
use crate::domains::membership::error::{MembershipError, MembershipResult};
use crate::domains::membership::guard::TransitionGuard;
use crate::domains::membership::machine::MembershipAction;
use crate::domains::membership::models::{Membership, MembershipStatus, Subject};
use crate::kernel::ServerDeps;

async fn act(
    membership: Membership,
    action: MembershipAction,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let standing = standing_for(&membership, actor, deps).await?;
    let transition = TransitionGuard::check_transition(&membership, action, &standing)?;
    apply(transition, actor, deps).await
}

/// Move a membership one step forward.
///
/// `pending -> company_approved` by the counterparty,
/// `company_approved -> admin_verified` by an admin.
pub async fn approve(
    membership_id: MembershipId,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let membership = load(membership_id, deps).await?;
    act(membership, MembershipAction::Approve, actor, deps).await
}

/// Reject a non-terminal membership.
pub async fn reject(
    membership_id: MembershipId,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let membership = load(membership_id, deps).await?;
    act(membership, MembershipAction::Reject, actor, deps).await
}

/// Apply `action` and insist it lands on `wanted`.
async fn act_towards(
    membership: Membership,
    wanted: MembershipStatus,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let action = match wanted {
        MembershipStatus::Rejected => MembershipAction::Reject,
        _ => MembershipAction::Approve,
    };

    let standing = standing_for(&membership, actor, deps).await?;
    let transition = TransitionGuard::check_transition(&membership, action, &standing)?;
    if transition.to != wanted {
        return Err(MembershipError::InvalidTransition {
            from: membership.status,
            action,
        });
    }
    apply(transition, actor, deps).await
}

fn parse_status(raw: &str, allowed: &[MembershipStatus]) -> MembershipResult<MembershipStatus> {
    raw.parse::<MembershipStatus>()
        .ok()
        .filter(|status| allowed.contains(status))
        .ok_or_else(|| MembershipError::validation("status", "The selected status is invalid."))
}

/// Subject-side answer to a company proposal, addressed by pair.
///
/// `status` is `company_approved` (accept) or `rejected`.
pub async fn set_status_for_pair(
    subject: Subject,
    page_id: PageId,
    status: &str,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let wanted = parse_status(
        status,
        &[MembershipStatus::CompanyApproved, MembershipStatus::Rejected],
    )?;

    let membership = deps
        .memberships
        .find_active_for_pair(subject, page_id)
        .await?
        .ok_or_else(|| MembershipError::not_found("Membership record not found"))?;

    act_towards(membership, wanted, actor, deps).await
}

/// Reject the live membership of a pair.
pub async fn reject_pair(
    subject: Subject,
    page_id: PageId,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let membership = deps
        .memberships
        .find_active_for_pair(subject, page_id)
        .await?
        .ok_or_else(MembershipError::membership_not_found)?;

    act(membership, MembershipAction::Reject, actor, deps).await
}

/// Admin verification decision: `admin_verified` or `rejected`.
pub async fn admin_set_status(
    membership_id: MembershipId,
    status: &str,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    actor.require_admin()?;
    let wanted = parse_status(
        status,
        &[MembershipStatus::AdminVerified, MembershipStatus::Rejected],
    )?;

    let membership = load(membership_id, deps).await?;
    act_towards(membership, wanted, actor, deps).await
}
