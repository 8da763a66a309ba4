//! Membership workflow against Postgres stores.

mod common;

use affiliation_core::common::{Actor, PageRequest};
use affiliation_core::domains::membership::activities;
use affiliation_core::domains::membership::models::{InsertOutcome, MembershipFilter, NewMembership};
use affiliation_core::domains::membership::{
    DocumentKind, InitiatedBy, MembershipError, MembershipStatus, Subject, UploadedFile,
};
use common::{create_test_page, create_test_user, engineer_details, TestHarness};
use test_context::test_context;

fn pdf(name: &str) -> UploadedFile {
    UploadedFile::new(name, b"%PDF-1.4 integration".to_vec())
}

struct World {
    member: Actor,
    owner: Actor,
    admin: Actor,
    company: affiliation_core::common::PageId,
}

async fn world(ctx: &TestHarness) -> World {
    let member = create_test_user(&ctx.db_pool, "Ayesha").await.unwrap();
    let owner = create_test_user(&ctx.db_pool, "Owner").await.unwrap();
    let admin = create_test_user(&ctx.db_pool, "Admin").await.unwrap();
    let company = create_test_page(&ctx.db_pool, owner, "Acme").await.unwrap();

    World {
        member: Actor::user(member),
        owner: Actor::user(owner),
        admin: Actor::admin(admin),
        company,
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_request_approve_verify_and_rerequest(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;
    let subject = Subject::User(w.member.user_id());

    let membership = activities::request_membership(
        subject,
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();
    assert_eq!(membership.status, MembershipStatus::Pending);
    assert_eq!(membership.job_title, "Engineer");

    let approved = activities::approve(membership.id, &w.owner, &deps).await.unwrap();
    assert_eq!(approved.status, MembershipStatus::CompanyApproved);

    let verified = activities::approve(membership.id, &w.admin, &deps).await.unwrap();
    assert_eq!(verified.status, MembershipStatus::AdminVerified);

    let again = activities::request_membership(
        subject,
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await;
    assert!(matches!(again, Err(MembershipError::Conflict(_))));

    // Verified is terminal
    assert!(matches!(
        activities::reject(membership.id, &w.owner, &deps).await,
        Err(MembershipError::AlreadyTerminal(MembershipStatus::AdminVerified))
    ));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_rerequest_after_rejection_creates_new_row(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;
    let subject = Subject::User(w.member.user_id());

    let first = activities::request_membership(
        subject,
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();
    activities::reject(first.id, &w.owner, &deps).await.unwrap();

    let renewed = activities::request_membership(
        subject,
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();
    assert_ne!(renewed.id, first.id);

    // The rejected row is kept as history
    let history = deps
        .memberships
        .list(&MembershipFilter::for_subject(subject))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, renewed.id);
    assert_eq!(history[1].status, MembershipStatus::Rejected);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_unique_index_enforces_pair_rule(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;
    let subject = Subject::User(w.member.user_id());

    let new_membership = || NewMembership {
        subject,
        page_id: w.company,
        details: engineer_details("Acme"),
        initiated_by: InitiatedBy::Subject,
    };

    let (first, second) = tokio::join!(
        deps.memberships.insert(new_membership()),
        deps.memberships.insert(new_membership()),
    );
    let outcomes = [first.unwrap(), second.unwrap()];

    let created = outcomes
        .iter()
        .filter(|o| matches!(o, InsertOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_concurrent_attach_of_same_kind_keeps_one_document(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;
    let membership = activities::request_membership(
        Subject::User(w.member.user_id()),
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();

    let (first, second) = tokio::join!(
        activities::attach_document(
            membership.id,
            DocumentKind::ProofDocument,
            pdf("payslip.pdf"),
            &w.member,
            &deps,
        ),
        activities::attach_document(
            membership.id,
            DocumentKind::ProofDocument,
            pdf("contract.pdf"),
            &w.member,
            &deps,
        ),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    let documents = deps.memberships.documents(membership.id).await.unwrap();
    assert_eq!(documents.len(), 1);

    let (kept, replaced) = if documents[0].id == first.id {
        (first, second)
    } else {
        (second, first)
    };
    assert_eq!(documents[0].id, kept.id);
    assert!(ctx.blob_exists(&kept.path));
    assert!(!ctx.blob_exists(&replaced.path));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_stale_transition_loses(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;
    let membership = activities::request_membership(
        Subject::User(w.member.user_id()),
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();

    let moved = deps
        .memberships
        .transition(
            membership.id,
            MembershipStatus::Pending,
            MembershipStatus::Rejected,
        )
        .await
        .unwrap();
    assert!(moved.is_some());

    let stale = deps
        .memberships
        .transition(
            membership.id,
            MembershipStatus::Pending,
            MembershipStatus::CompanyApproved,
        )
        .await
        .unwrap();
    assert!(stale.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_document_replacement_removes_old_file(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;
    let membership = activities::request_membership(
        Subject::User(w.member.user_id()),
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();

    let first = activities::attach_document(
        membership.id,
        DocumentKind::ProofDocument,
        pdf("payslip.pdf"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();
    assert!(ctx.blob_exists(&first.path));

    let second = activities::attach_document(
        membership.id,
        DocumentKind::ProofDocument,
        pdf("contract.pdf"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();

    let documents = deps.memberships.documents(membership.id).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, second.id);
    assert!(!ctx.blob_exists(&first.path));
    assert!(ctx.blob_exists(&second.path));

    // Cancelling deletes rows and files
    activities::cancel_request(membership.id, &w.member, &deps)
        .await
        .unwrap();
    assert!(deps.memberships.find(membership.id).await.unwrap().is_none());
    assert!(!ctx.blob_exists(&second.path));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_company_proposal_and_member_acceptance(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;
    let subject = Subject::User(w.member.user_id());

    let proposed = activities::propose_membership(
        subject,
        w.company,
        engineer_details("Acme"),
        vec![
            (DocumentKind::ConfirmationLetter, pdf("letter.pdf")),
            (DocumentKind::ProofDocument, pdf("proof.pdf")),
        ],
        &w.owner,
        &deps,
    )
    .await
    .unwrap();
    assert_eq!(proposed.documents.len(), 2);
    assert_eq!(proposed.page.as_ref().map(|p| p.id), Some(w.company));

    let invitations = activities::invitations_for(subject, &w.member, &deps)
        .await
        .unwrap();
    assert_eq!(invitations.len(), 1);

    activities::set_status_for_pair(subject, w.company, "company_approved", &w.member, &deps)
        .await
        .unwrap();

    let queue = activities::admin_queue(InitiatedBy::Company, &w.admin, &deps)
        .await
        .unwrap();
    assert!(queue.iter().any(|d| d.membership.id == proposed.membership.id));

    activities::admin_set_status(proposed.membership.id, "admin_verified", &w.admin, &deps)
        .await
        .unwrap();

    let members = activities::page_members(w.company, &deps).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "Ayesha");
    assert!(activities::has_verified_badge(&w.member, &deps).await.unwrap());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_browse_companies_pages_through_directory(ctx: &TestHarness) {
    let deps = ctx.deps();
    let w = world(ctx).await;

    activities::request_membership(
        Subject::User(w.member.user_id()),
        w.company,
        engineer_details("Acme"),
        &w.member,
        &deps,
    )
    .await
    .unwrap();

    let listing = activities::browse_companies(
        &w.member,
        PageRequest::new(Some(1), Some(100), activities::BROWSE_COMPANIES_PER_PAGE),
        &deps,
    )
    .await
    .unwrap();

    // Pages with a pending request are skipped
    assert!(listing.data.iter().all(|p| p.id != w.company));
    assert_eq!(listing.per_page, 100);
}
