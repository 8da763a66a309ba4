//! Supporting documents

use tracing::{info, warn};

use super::{apply, expand_one, load, standing_for};
use crate::common::{Actor, MembershipId};
use crate::domains::membership::data::MembershipData;
use crate::domains::membership::error::{FieldErrors, MembershipError, MembershipResult};
use crate::domains::membership::guard::{Transition, TransitionGuard};
use crate::domains::membership::machine::MembershipAction;
use crate::domains::membership::models::{
    DocumentKind, MembershipDocument, NewDocument, UploadedFile, UploaderParty,
};
use crate::kernel::ServerDeps;

/// Type and size checks for a batch of uploads, keyed by document field
pub(crate) fn check_files(
    files: &[(DocumentKind, UploadedFile)],
    deps: &ServerDeps,
) -> MembershipResult<()> {
    let mut errors = FieldErrors::new();
    for (kind, file) in files {
        errors.extend(kind.field_name(), file.check(*kind, deps.max_upload_bytes));
    }
    errors.into_result(())
}

/// Write the file, record it, and drop whatever it replaced.
///
/// If recording fails the new file is removed again.
pub(crate) async fn store_document(
    membership_id: MembershipId,
    kind: DocumentKind,
    file: UploadedFile,
    party: UploaderParty,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<MembershipDocument> {
    let path = file.storage_path(membership_id);
    let content_type = file.resolved_content_type();
    let size_bytes = file.bytes.len() as i64;

    deps.blobs.put(&path, file.bytes.clone()).await?;

    let recorded = deps
        .memberships
        .upsert_document(NewDocument {
            membership_id,
            kind,
            path: path.clone(),
            original_name: file.file_name,
            content_type,
            size_bytes,
            uploaded_by: party,
            uploaded_by_user: actor.user_id(),
        })
        .await;

    let (document, previous) = match recorded {
        Ok(recorded) => recorded,
        Err(e) => {
            if let Err(cleanup) = deps.blobs.delete(&path).await {
                warn!(path = %path, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    if let Some(previous) = previous {
        if let Err(e) = deps.blobs.delete(&previous.path).await {
            warn!(path = %previous.path, error = %e, "Failed to remove replaced document");
        }
    }

    info!(
        membership_id = %membership_id,
        kind = %kind,
        size_bytes,
        uploaded_by = ?party,
        "Document stored"
    );
    Ok(document)
}

/// Attach (or replace) one document of a membership.
pub async fn attach_document(
    membership_id: MembershipId,
    kind: DocumentKind,
    file: UploadedFile,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<MembershipDocument> {
    let membership = load(membership_id, deps).await?;
    let standing = standing_for(&membership, actor, deps).await?;
    let party = TransitionGuard::check_attach(&membership, &standing)?;

    let files = [(kind, file)];
    check_files(&files, deps)?;
    let [(kind, file)] = files;

    store_document(membership.id, kind, file, party, actor, deps).await
}

/// Company page owner answers a request with both documents, approving it.
pub async fn respond_with_documents(
    membership_id: MembershipId,
    confirmation_letter: Option<UploadedFile>,
    proof_document: Option<UploadedFile>,
    actor: &Actor,
    deps: &ServerDeps,
) -> MembershipResult<MembershipData> {
    info!(membership_id = %membership_id, actor = %actor.user_id(), "Company responding to membership request");

    let mut errors = FieldErrors::new();
    let mut files = Vec::with_capacity(2);
    for (kind, file) in [
        (DocumentKind::ConfirmationLetter, confirmation_letter),
        (DocumentKind::ProofDocument, proof_document),
    ] {
        match file {
            Some(file) => files.push((kind, file)),
            None => errors.add(
                kind.field_name(),
                format!("The {} field is required.", kind.field_name().replace('_', " ")),
            ),
        }
    }
    errors.into_result(())?;

    let membership = load(membership_id, deps).await?;
    let standing = standing_for(&membership, actor, deps).await?;
    if !standing.company_side {
        return Err(MembershipError::forbidden(
            "Only the company page owner can respond to this request",
        ));
    }
    let transition = TransitionGuard::check_transition(&membership, MembershipAction::Approve, &standing)?;
    check_files(&files, deps)?;

    // Files go in only once the approval has won; a lost race stores nothing
    let approved = apply(transition, actor, deps).await?;

    for (kind, file) in files {
        if let Err(e) =
            store_document(approved.id, kind, file, UploaderParty::Company, actor, deps).await
        {
            revert(&transition, deps).await;
            return Err(e);
        }
    }

    expand_one(approved, deps).await
}

/// Put the status back after the documents backing it failed to store
async fn revert(transition: &Transition, deps: &ServerDeps) {
    match deps
        .memberships
        .transition(transition.membership_id, transition.to, transition.from)
        .await
    {
        Ok(Some(_)) => info!(
            membership_id = %transition.membership_id,
            status = %transition.from,
            "Reverted approval after document upload failed"
        ),
        Ok(None) => warn!(
            membership_id = %transition.membership_id,
            "Approval not reverted, membership changed meanwhile"
        ),
        Err(e) => warn!(
            membership_id = %transition.membership_id,
            error = %e,
            "Failed to revert approval"
        ),
    }
}
