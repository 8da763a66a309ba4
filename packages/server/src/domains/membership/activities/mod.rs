//! Membership activities - business operations
//!
//! Activities compose the transition guard with the stores. Every operation
//! takes the acting user explicitly and returns `MembershipResult`.

mod documents;
mod lifecycle;
mod queries;
mod request;
mod transitions;

pub use documents::*;
pub use lifecycle::*;
pub use queries::*;
pub use request::*;
pub use transitions::*;


use std::collections::HashMap;

use tracing::info;

use crate::common::{Actor, MembershipId, PageId};
use crate::domains::membership::data::MembershipData;
use crate::domains::membership::error::{MembershipError, MembershipResult};
use crate::domains::membership::guard::{Standing, Transition};
use crate::domains::membership::models::{Membership, Subject};
use crate::kernel::ServerDeps;

/// Load a membership or fail with NotFound
pub(crate) async fn load(id: MembershipId, deps: &ServerDeps) -> MembershipResult<Membership> {
    deps.memberships
        .find(id)
        .await?
        .ok_or_else(MembershipError::membership_not_found)
}

pub(crate) async fn owns_page(
    page_id: PageId,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<bool> {
    Ok(deps
        .directory
        .find_page(page_id)
        .await?
        .map(|page| page.is_owned_by(actor.user_id()))
        .unwrap_or(false))
}

/// Is the actor the subject user, or the owner of the subject page?
pub(crate) async fn is_subject_side(
    subject: Subject,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<bool> {
    match subject {
        Subject::User(user_id) => Ok(user_id == actor.user_id()),
        Subject::Page(page_id) => owns_page(page_id, actor, deps).await,
    }
}

/// How the actor relates to a membership
pub(crate) async fn standing_for(
    membership: &Membership,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Standing> {
    Ok(Standing {
        subject_side: is_subject_side(membership.subject(), actor, deps).await?,
        company_side: owns_page(membership.page_id, actor, deps).await?,
        admin: actor.is_admin(),
    })
}

/// Fail unless the actor speaks for `subject` (or is an admin)
pub(crate) async fn require_subject_side(
    subject: Subject,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<()> {
    if actor.is_admin() || is_subject_side(subject, actor, deps).await? {
        Ok(())
    } else {
        Err(MembershipError::forbidden(
            "You can only view memberships of yourself or pages you own",
        ))
    }
}

/// Apply a checked transition with compare-and-set.
///
/// Losing a race to another writer surfaces as Conflict with the status
/// actually found.
pub(crate) async fn apply(
    transition: Transition,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let updated = deps
        .memberships
        .transition(transition.membership_id, transition.from, transition.to)
        .await?;

    match updated {
        Some(membership) => {
            info!(
                membership_id = %membership.id,
                action = %transition.action,
                from = %transition.from,
                to = %transition.to,
                actor = %actor.user_id(),
                "Membership status changed"
            );
            Ok(membership)
        }
        None => match deps.memberships.find(transition.membership_id).await? {
            Some(current) => Err(MembershipError::conflict(format!(
                "Membership changed while processing, it is now {}",
                current.status
            ))),
            None => Err(MembershipError::membership_not_found()),
        },
    }
}

/// Attach documents and target pages to memberships
pub(crate) async fn expand(
    memberships: Vec<Membership>,
    deps: &ServerDeps,
) -> MembershipResult<Vec<MembershipData>> {
    let mut page_ids: Vec<PageId> = memberships.iter().map(|m| m.page_id).collect();
    page_ids.sort();
    page_ids.dedup();

    let pages: HashMap<PageId, _> = deps
        .directory
        .find_pages(&page_ids)
        .await?
        .into_iter()
        .map(|page| (page.id, page))
        .collect();

    let mut expanded = Vec::with_capacity(memberships.len());
    for membership in memberships {
        let documents = deps.memberships.documents(membership.id).await?;
        let page = pages.get(&membership.page_id).cloned();
        expanded.push(MembershipData {
            membership,
            documents,
            page,
        });
    }
    Ok(expanded)
}

pub(crate) async fn expand_one(
    membership: Membership,
    deps: &ServerDeps,
) -> MembershipResult<MembershipData> {
    expand(vec![membership], deps)
        .await?
        .pop()
        .ok_or_else(|| MembershipError::Internal(anyhow::anyhow!("Expanded membership vanished")))
}
