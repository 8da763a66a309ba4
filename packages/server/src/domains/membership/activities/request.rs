//! Creating memberships from either side

use tracing::{info, warn};

use super::{expand_one, is_subject_side};
use crate::common::{Actor, PageId};
use crate::domains::directory::PageSummary;
use crate::domains::membership::activities::documents::{check_files, store_document};
use crate::domains::membership::data::MembershipData;
use crate::domains::membership::error::{MembershipError, MembershipResult};
use crate::domains::membership::guard::{Standing, TransitionGuard};
use crate::domains::membership::models::{
    DocumentKind, InitiatedBy, InsertOutcome, Membership, MembershipDetails, NewMembership,
    Subject, UploadedFile, UploaderParty,
};
use crate::kernel::ServerDeps;

async fn target_page(page_id: PageId, deps: &ServerDeps) -> MembershipResult<PageSummary> {
    deps.directory
        .find_page(page_id)
        .await?
        .ok_or_else(|| MembershipError::not_found("Company page not found"))
}

async fn ensure_subject_exists(subject: Subject, deps: &ServerDeps) -> MembershipResult<()> {
    let exists = match subject {
        Subject::User(user_id) => deps.directory.find_user(user_id).await?.is_some(),
        Subject::Page(page_id) => deps.directory.find_page(page_id).await?.is_some(),
    };
    if exists {
        Ok(())
    } else {
        Err(MembershipError::not_found(match subject {
            Subject::User(_) => "User not found",
            Subject::Page(_) => "Requesting page not found",
        }))
    }
}

fn created_or_conflict(outcome: InsertOutcome) -> MembershipResult<Membership> {
    match outcome {
        InsertOutcome::Created(membership) => Ok(membership),
        InsertOutcome::Duplicate(existing) => Err(MembershipError::conflict(format!(
            "There is already a {} membership for this company",
            existing.status
        ))),
    }
}

/// Subject asks to be recognised as a member of `page_id`.
///
/// Creates a `pending` membership. Fails with Conflict while the pair has a
/// pending, company-approved or verified membership.
pub async fn request_membership(
    subject: Subject,
    page_id: PageId,
    details: MembershipDetails,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    info!(subject = %subject, page_id = %page_id, actor = %actor.user_id(), "Requesting membership");

    let page = target_page(page_id, deps).await?;
    ensure_subject_exists(subject, deps).await?;

    let standing = Standing {
        subject_side: is_subject_side(subject, actor, deps).await?,
        company_side: page.is_owned_by(actor.user_id()),
        admin: actor.is_admin(),
    };
    TransitionGuard::check_request(subject, page_id, InitiatedBy::Subject, &standing)?;

    let outcome = deps
        .memberships
        .insert(NewMembership {
            subject,
            page_id,
            details,
            initiated_by: InitiatedBy::Subject,
        })
        .await?;
    let membership = created_or_conflict(outcome)?;

    info!(membership_id = %membership.id, "Membership requested");
    Ok(membership)
}

/// Company page owner proposes `subject` as a member, with supporting documents.
///
/// The membership starts `pending` and waits for the subject side to accept.
pub async fn propose_membership(
    subject: Subject,
    page_id: PageId,
    details: MembershipDetails,
    documents: Vec<(DocumentKind, UploadedFile)>,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<MembershipData> {
    info!(subject = %subject, page_id = %page_id, actor = %actor.user_id(), "Proposing membership");

    let page = target_page(page_id, deps).await?;
    ensure_subject_exists(subject, deps).await?;

    let standing = Standing {
        subject_side: is_subject_side(subject, actor, deps).await?,
        company_side: page.is_owned_by(actor.user_id()),
        admin: actor.is_admin(),
    };
    TransitionGuard::check_request(subject, page_id, InitiatedBy::Company, &standing)?;
    check_files(&documents, deps)?;

    let outcome = deps
        .memberships
        .insert(NewMembership {
            subject,
            page_id,
            details,
            initiated_by: InitiatedBy::Company,
        })
        .await?;
    let membership = created_or_conflict(outcome)?;

    let mut stored_paths = Vec::new();
    for (kind, file) in documents {
        match store_document(membership.id, kind, file, UploaderParty::Company, actor, deps).await {
            Ok(document) => stored_paths.push(document.path),
            Err(e) => {
                // Leave nothing half-created behind
                warn!(membership_id = %membership.id, error = %e, "Proposal upload failed, removing membership");
                if let Err(cleanup) = deps.memberships.delete(membership.id).await {
                    warn!(membership_id = %membership.id, error = %cleanup, "Failed to remove membership");
                }
                for path in &stored_paths {
                    if let Err(cleanup) = deps.blobs.delete(path).await {
                        warn!(path = %path, error = %cleanup, "Failed to remove stored document");
                    }
                }
                return Err(e);
            }
        }
    }

    info!(membership_id = %membership.id, "Membership proposed");
    expand_one(membership, deps).await
}
