//! Editing and deleting memberships

use tracing::{info, warn};

use super::{expand_one, load, standing_for};
use crate::common::{Actor, MembershipId, PageId};
use crate::domains::membership::activities::documents::store_document;
use crate::domains::membership::data::{DetailsInput, MembershipData};
use crate::domains::membership::error::{FieldErrors, MembershipError, MembershipResult};
use crate::domains::membership::guard::TransitionGuard;
use crate::domains::membership::models::{
    DocumentKind, Membership, MembershipDocument, Subject, UploadedFile,
};
use crate::kernel::ServerDeps;

/// Edit the claimed position, optionally replacing documents.
pub async fn update_membership(
    membership_id: MembershipId,
    input: DetailsInput,
    documents: Vec<(DocumentKind, UploadedFile)>,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<MembershipData> {
    let membership = load(membership_id, deps).await?;
    let standing = standing_for(&membership, actor, deps).await?;
    TransitionGuard::check_edit(&membership, &standing)?;
    let party = standing
        .uploader()
        .ok_or_else(|| MembershipError::forbidden("You are not a party to this membership"))?;

    let mut errors = FieldErrors::new();
    let details = input.validate(Some(&membership.company_name), &mut errors);
    for (kind, file) in &documents {
        errors.extend(kind.field_name(), file.check(*kind, deps.max_upload_bytes));
    }
    let details = match details {
        Some(details) if errors.is_empty() => details,
        _ => return Err(MembershipError::Validation(errors)),
    };

    let updated = deps
        .memberships
        .update_details(membership.id, membership.status, &details)
        .await?;
    let updated = match updated {
        Some(updated) => updated,
        None => {
            return Err(match deps.memberships.find(membership.id).await? {
                Some(current) => MembershipError::conflict(format!(
                    "Membership changed while editing, it is now {}",
                    current.status
                )),
                None => MembershipError::membership_not_found(),
            })
        }
    };

    for (kind, file) in documents {
        store_document(updated.id, kind, file, party, actor, deps).await?;
    }

    info!(membership_id = %updated.id, actor = %actor.user_id(), "Membership updated");
    expand_one(updated, deps).await
}

/// Remove stored files of deleted document rows
async fn discard_files(documents: &[MembershipDocument], deps: &ServerDeps) {
    for document in documents {
        if let Err(e) = deps.blobs.delete(&document.path).await {
            warn!(path = %document.path, error = %e, "Failed to remove document file");
        }
    }
}

async fn delete(membership: &Membership, deps: &ServerDeps) -> MembershipResult<()> {
    let documents = deps
        .memberships
        .delete(membership.id)
        .await?
        .ok_or_else(MembershipError::membership_not_found)?;
    discard_files(&documents, deps).await;
    Ok(())
}

/// Requester withdraws its own pending request. The row and its files are deleted.
pub async fn cancel_request(
    membership_id: MembershipId,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let membership = load(membership_id, deps).await?;
    let standing = standing_for(&membership, actor, deps).await?;
    TransitionGuard::check_cancel(&membership, &standing)?;

    delete(&membership, deps).await?;

    info!(membership_id = %membership.id, actor = %actor.user_id(), "Membership request cancelled");
    Ok(membership)
}

/// Delete the live membership of a pair, with its documents.
pub async fn remove_member(
    page_id: PageId,
    subject: Subject,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<Membership> {
    let membership = deps
        .memberships
        .find_active_for_pair(subject, page_id)
        .await?
        .ok_or_else(MembershipError::membership_not_found)?;
    let standing = standing_for(&membership, actor, deps).await?;
    TransitionGuard::check_remove(&membership, &standing)?;

    delete(&membership, deps).await?;

    info!(
        membership_id = %membership.id,
        subject = %subject,
        page_id = %page_id,
        actor = %actor.user_id(),
        "Member removed"
    );
    Ok(membership)
}
