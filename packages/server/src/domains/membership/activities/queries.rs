//! Read-side membership operations

use std::collections::HashMap;

use tracing::debug;

use super::{expand, expand_one, load, owns_page, require_subject_side, standing_for};
use crate::common::{Actor, MembershipId, PageId, PageRequest, Paginated, UserId};
use crate::domains::directory::PageSummary;
use crate::domains::membership::data::{
    CandidateListing, ConfirmedMemberships, MemberCard, MembershipData,
};
use crate::domains::membership::error::{MembershipError, MembershipResult};
use crate::domains::membership::guard::TransitionGuard;
use crate::domains::membership::models::{
    InitiatedBy, MembershipFilter, MembershipStatus, Subject,
};
use crate::kernel::ServerDeps;

const LIVE: [MembershipStatus; 3] = [
    MembershipStatus::Pending,
    MembershipStatus::CompanyApproved,
    MembershipStatus::AdminVerified,
];

/// Default page size for `browse_companies`
pub const BROWSE_COMPANIES_PER_PAGE: i64 = 2;

/// Default page size for `invite_candidates`
pub const INVITE_CANDIDATES_PER_PAGE: i64 = 10;

/// Membership with its documents and target page
pub async fn get_membership(
    membership_id: MembershipId,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<MembershipData> {
    let membership = load(membership_id, deps).await?;
    let standing = standing_for(&membership, actor, deps).await?;
    TransitionGuard::check_view(&membership, &standing)?;
    expand_one(membership, deps).await
}

/// Open (pending or company-approved) memberships of a subject
pub async fn pending_for_subject(
    subject: Subject,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Vec<MembershipData>> {
    require_subject_side(subject, actor, deps).await?;

    let filter = MembershipFilter::for_subject(subject).with_statuses(&[
        MembershipStatus::Pending,
        MembershipStatus::CompanyApproved,
    ]);
    expand(deps.memberships.list(&filter).await?, deps).await
}

/// Verified memberships of a subject, split by who started them
pub async fn confirmed_for_subject(
    subject: Subject,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<ConfirmedMemberships> {
    require_subject_side(subject, actor, deps).await?;

    let filter =
        MembershipFilter::for_subject(subject).with_statuses(&[MembershipStatus::AdminVerified]);
    let memberships = expand(deps.memberships.list(&filter).await?, deps).await?;

    let (requested, proposed): (Vec<_>, Vec<_>) = memberships
        .into_iter()
        .partition(|data| data.membership.initiated_by == InitiatedBy::Subject);

    Ok(ConfirmedMemberships {
        requested,
        proposed,
    })
}

/// Pending requests waiting on pages the actor owns, newest first.
///
/// Returns None when the actor owns no pages at all.
pub async fn owner_inbox(
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Option<Vec<MembershipData>>> {
    let owned: Vec<PageId> = deps
        .directory
        .pages_owned_by(actor.user_id())
        .await?
        .into_iter()
        .map(|page| page.id)
        .collect();

    if owned.is_empty() {
        debug!(actor = %actor.user_id(), "Owner inbox requested by user without pages");
        return Ok(None);
    }

    let filter = MembershipFilter::for_pages(owned)
        .with_statuses(&[MembershipStatus::Pending])
        .initiated_by(InitiatedBy::Subject);
    Ok(Some(expand(deps.memberships.list(&filter).await?, deps).await?))
}

/// Pending company proposals addressed to a subject
pub async fn invitations_for(
    subject: Subject,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Vec<MembershipData>> {
    require_subject_side(subject, actor, deps).await?;

    let filter = MembershipFilter::for_subject(subject)
        .with_statuses(&[MembershipStatus::Pending])
        .initiated_by(InitiatedBy::Company);
    expand(deps.memberships.list(&filter).await?, deps).await
}

/// Cards for every verified member of a page
pub async fn page_members(page_id: PageId, deps: &ServerDeps) -> MembershipResult<Vec<MemberCard>> {
    deps.directory
        .find_page(page_id)
        .await?
        .ok_or_else(|| MembershipError::not_found("Company page not found"))?;

    let filter = MembershipFilter::for_pages(vec![page_id])
        .with_statuses(&[MembershipStatus::AdminVerified]);
    let memberships = deps.memberships.list(&filter).await?;

    let mut user_ids = Vec::new();
    let mut page_ids = Vec::new();
    for membership in &memberships {
        match membership.subject() {
            Subject::User(id) => user_ids.push(id),
            Subject::Page(id) => page_ids.push(id),
        }
    }

    let users: HashMap<_, _> = deps
        .directory
        .find_users(&user_ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    let pages: HashMap<_, _> = deps
        .directory
        .find_pages(&page_ids)
        .await?
        .into_iter()
        .map(|page| (page.id, page))
        .collect();

    // Subjects deleted from the directory drop out of the listing
    Ok(memberships
        .iter()
        .filter_map(|membership| match membership.subject() {
            Subject::User(id) => users.get(&id).map(|user| MemberCard::for_user(membership, user)),
            Subject::Page(id) => pages.get(&id).map(|page| MemberCard::for_page(membership, page)),
        })
        .collect())
}

/// Live memberships where `subject_page` is the member
pub async fn affiliations_of(
    subject_page: PageId,
    deps: &ServerDeps,
) -> MembershipResult<Vec<MembershipData>> {
    let filter = MembershipFilter::for_subject(Subject::Page(subject_page)).with_statuses(&LIVE);
    expand(deps.memberships.list(&filter).await?, deps).await
}

/// Pages the actor is a verified member of
pub async fn verified_companies(
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Vec<PageSummary>> {
    let filter = MembershipFilter::for_subject(Subject::User(actor.user_id()))
        .with_statuses(&[MembershipStatus::AdminVerified]);
    let page_ids: Vec<PageId> = deps
        .memberships
        .list(&filter)
        .await?
        .into_iter()
        .map(|membership| membership.page_id)
        .collect();

    Ok(deps.directory.find_pages(&page_ids).await?)
}

/// Whether the actor holds at least one verified membership
pub async fn has_verified_badge(actor: &Actor, deps: &ServerDeps) -> MembershipResult<bool> {
    let filter = MembershipFilter::for_subject(Subject::User(actor.user_id()))
        .with_statuses(&[MembershipStatus::AdminVerified]);
    Ok(!deps.memberships.list(&filter).await?.is_empty())
}

/// Companies the actor could request, skipping those with a pending request
pub async fn browse_companies(
    actor: &Actor,
    request: PageRequest,
    deps: &ServerDeps,
) -> MembershipResult<Paginated<PageSummary>> {
    let filter = MembershipFilter::for_subject(Subject::User(actor.user_id()))
        .with_statuses(&[MembershipStatus::Pending]);
    let requested: Vec<PageId> = deps
        .memberships
        .list(&filter)
        .await?
        .into_iter()
        .map(|membership| membership.page_id)
        .collect();

    let (pages, total) = deps
        .directory
        .list_pages(&requested, request.limit(), request.offset())
        .await?;
    Ok(Paginated::new(pages, total, &request))
}

/// Pages and users a company page could still invite.
///
/// Skips subjects with a live membership at the page, the page itself and
/// the actor.
pub async fn invite_candidates(
    page_id: PageId,
    actor: &Actor,
    request: PageRequest,
    deps: &ServerDeps,
) -> MembershipResult<CandidateListing> {
    deps.directory
        .find_page(page_id)
        .await?
        .ok_or_else(|| MembershipError::not_found("Company page not found"))?;
    if !actor.is_admin() && !owns_page(page_id, actor, deps).await? {
        return Err(MembershipError::forbidden(
            "Only the owner of the company page can invite members",
        ));
    }

    let filter = MembershipFilter::for_pages(vec![page_id]).with_statuses(&LIVE);
    let mut excluded_pages = vec![page_id];
    let mut excluded_users: Vec<UserId> = vec![actor.user_id()];
    for membership in deps.memberships.list(&filter).await? {
        match membership.subject() {
            Subject::User(id) => excluded_users.push(id),
            Subject::Page(id) => excluded_pages.push(id),
        }
    }

    let (pages, pages_total) = deps
        .directory
        .list_pages(&excluded_pages, request.limit(), request.offset())
        .await?;
    let (users, users_total) = deps
        .directory
        .list_users(&excluded_users, request.limit(), request.offset())
        .await?;

    Ok(CandidateListing {
        pages: Paginated::new(pages, pages_total, &request),
        users: Paginated::new(users, users_total, &request),
    })
}

/// Admin: company-approved memberships waiting for verification
pub async fn admin_queue(
    initiated_by: InitiatedBy,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Vec<MembershipData>> {
    actor.require_admin()?;

    let filter = MembershipFilter::default()
        .with_statuses(&[MembershipStatus::CompanyApproved])
        .initiated_by(initiated_by);
    expand(deps.memberships.list(&filter).await?, deps).await
}
