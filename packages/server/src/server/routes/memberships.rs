//! Membership endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::envelope::{created, failure, json_body, membership_path, ok, HandlerResult};
use super::form::{details_form, document_form, propose_form, response_form};
use crate::common::{MembershipId, PageId, PageRequest, UserId};
use crate::domains::membership::activities;
use crate::domains::membership::data::{RequestMembershipInput, RequestReceipt};
use crate::domains::membership::{MembershipError, MembershipResult, Subject};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

// =============================================================================
// Request bodies
// =============================================================================

fn required(value: Option<i64>, key: &str) -> MembershipResult<i64> {
    value.ok_or_else(|| {
        MembershipError::validation(
            key,
            format!("The {} field is required.", key.replace('_', " ")),
        )
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct IdBody {
    #[serde(alias = "membership_id")]
    pub id: Option<i64>,
}

impl IdBody {
    fn membership_id(&self) -> MembershipResult<MembershipId> {
        required(self.id, "id").map(MembershipId::new)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MembershipIdBody {
    #[serde(alias = "id", alias = "membershipId")]
    pub membership_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageIdBody {
    #[serde(alias = "company_id", alias = "pageId")]
    pub page_id: Option<i64>,
}

impl PageIdBody {
    fn page_id(&self) -> MembershipResult<PageId> {
        required(self.page_id, "page_id").map(PageId::new)
    }
}

/// A (subject, company page) pair, with an optional status
#[derive(Debug, Default, Deserialize)]
pub struct PairBody {
    #[serde(alias = "company_id", alias = "pageId")]
    pub page_id: Option<i64>,
    #[serde(alias = "userId")]
    pub user_id: Option<i64>,
    #[serde(alias = "userPageId")]
    pub user_page_id: Option<i64>,
    pub status: Option<String>,
}

impl PairBody {
    fn page_id(&self) -> MembershipResult<PageId> {
        required(self.page_id, "page_id").map(PageId::new)
    }

    /// A page subject when `user_page_id` is given, otherwise a user subject
    fn subject(&self) -> MembershipResult<Subject> {
        match (self.user_page_id, self.user_id) {
            (Some(page), _) => Ok(Subject::Page(PageId::new(page))),
            (None, Some(user)) => Ok(Subject::User(UserId::new(user))),
            (None, None) => Err(MembershipError::validation(
                "user_id",
                "The user id field is required.",
            )),
        }
    }

    fn page_subject(&self) -> MembershipResult<Subject> {
        required(self.user_page_id, "user_page_id").map(|id| Subject::Page(PageId::new(id)))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PagingBody {
    #[serde(alias = "company_id", alias = "pageId")]
    pub page_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// =============================================================================
// Creating memberships
// =============================================================================

/// POST /requestmembership
pub async fn request_membership_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<RequestMembershipInput>, JsonRejection>,
) -> HandlerResult {
    let (page_id, details) = json_body(body)?.into_parts()?;
    let membership = activities::request_membership(
        Subject::User(auth.user_id),
        page_id,
        details,
        &auth.actor(),
        &state.deps,
    )
    .await?;

    created(
        "Membership request submitted successfully",
        RequestReceipt::from(&membership),
    )
}

/// POST /requestCompanyAffiliations
pub async fn request_company_affiliation_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<RequestMembershipInput>, JsonRejection>,
) -> HandlerResult {
    let (page_id, user_page_id, details) = json_body(body)?.into_page_parts()?;
    let membership = activities::request_membership(
        Subject::Page(user_page_id),
        page_id,
        details,
        &auth.actor(),
        &state.deps,
    )
    .await?;

    created(
        "Affiliation request submitted successfully",
        RequestReceipt::from(&membership),
    )
}

/// POST /requestMembershipCompanySide (multipart)
pub async fn propose_membership_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> HandlerResult {
    let (subject, page_id, details, documents) = propose_form(multipart).await?.into_parts()?;
    let data = activities::propose_membership(
        subject,
        page_id,
        details,
        documents,
        &auth.actor(),
        &state.deps,
    )
    .await?;

    created("Membership proposal sent successfully", data)
}

// =============================================================================
// Single membership
// =============================================================================

/// POST /getMembership/:id
pub async fn get_membership_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult {
    let id = membership_path(path)?;
    let data = activities::get_membership(id, &auth.actor(), &state.deps).await?;
    ok("Membership retrieved successfully", data)
}

/// POST /updateMembership/:id (multipart)
pub async fn update_membership_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    multipart: Multipart,
) -> HandlerResult {
    let id = membership_path(path)?;
    let (details, documents) = details_form(multipart).await?;
    let data = activities::update_membership(
        id,
        details,
        documents,
        &auth.actor(),
        &state.deps,
    )
    .await?;

    ok("Membership updated successfully", data)
}

/// POST /membershipDocuments/:id (multipart: kind, file)
pub async fn attach_document_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    multipart: Multipart,
) -> HandlerResult {
    let id = membership_path(path)?;
    let (kind, file) = document_form(multipart).await?;
    let document = activities::attach_document(
        id,
        kind,
        file,
        &auth.actor(),
        &state.deps,
    )
    .await?;

    created("Document uploaded successfully", document)
}

/// POST /approveMembership/:id
pub async fn approve_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult {
    let id = membership_path(path)?;
    let membership = activities::approve(id, &auth.actor(), &state.deps).await?;
    ok("Membership approved successfully", membership)
}

/// POST /rejectMembership/:id
pub async fn reject_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult {
    let id = membership_path(path)?;
    let membership = activities::reject(id, &auth.actor(), &state.deps).await?;
    ok("Membership rejected successfully", membership)
}

/// POST /storecompaniesresponses (multipart)
pub async fn store_company_response_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> HandlerResult {
    let form = response_form(multipart).await?;
    let data = activities::respond_with_documents(
        form.membership_id,
        form.confirmation_letter,
        form.proof_document,
        &auth.actor(),
        &state.deps,
    )
    .await?;

    ok("Company response stored successfully", data)
}

/// POST /approvedCompanyInvitations
pub async fn accept_invitation_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<IdBody>, JsonRejection>,
) -> HandlerResult {
    let id = json_body(body)?.membership_id()?;
    let membership = activities::approve(id, &auth.actor(), &state.deps).await?;
    ok("Invitation accepted successfully", membership)
}

/// POST /rejectCompanyInvitations
pub async fn reject_invitation_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<IdBody>, JsonRejection>,
) -> HandlerResult {
    let id = json_body(body)?.membership_id()?;
    let membership = activities::reject(id, &auth.actor(), &state.deps).await?;
    ok("Invitation rejected successfully", membership)
}

// =============================================================================
// Pair-addressed operations
// =============================================================================

/// POST /membershipstatususerside
pub async fn pair_status_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<PairBody>, JsonRejection>,
) -> HandlerResult {
    let body = json_body(body)?;
    let status = body.status.clone().ok_or_else(|| {
        MembershipError::validation("status", "The status field is required.")
    })?;

    let membership = activities::set_status_for_pair(
        body.subject()?,
        body.page_id()?,
        &status,
        &auth.actor(),
        &state.deps,
    )
    .await?;

    ok("Membership status updated successfully", membership)
}

/// POST /cancelMembershipRequest
pub async fn cancel_request_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<MembershipIdBody>, JsonRejection>,
) -> HandlerResult {
    let id = required(json_body(body)?.membership_id, "membership_id")?;
    let membership =
        activities::cancel_request(MembershipId::new(id), &auth.actor(), &state.deps).await?;
    ok("Membership request cancelled successfully", membership)
}

/// POST /cancelmembership
pub async fn cancel_membership_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<PairBody>, JsonRejection>,
) -> HandlerResult {
    let body = json_body(body)?;
    let membership =
        activities::reject_pair(body.subject()?, body.page_id()?, &auth.actor(), &state.deps)
            .await?;
    ok("Membership request rejected successfully", membership)
}

/// POST /removemember
pub async fn remove_member_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<PairBody>, JsonRejection>,
) -> HandlerResult {
    let body = json_body(body)?;
    let membership =
        activities::remove_member(body.page_id()?, body.subject()?, &auth.actor(), &state.deps)
            .await?;
    ok("Member removed successfully", membership)
}

/// POST /removeCompanyMembership
pub async fn remove_company_membership_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<PairBody>, JsonRejection>,
) -> HandlerResult {
    let body = json_body(body)?;
    let membership = activities::remove_member(
        body.page_id()?,
        body.page_subject()?,
        &auth.actor(),
        &state.deps,
    )
    .await?;
    ok("Company membership removed successfully", membership)
}

// =============================================================================
// Listings
// =============================================================================

/// POST /getUserPendingMemberships
pub async fn user_pending_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    let data = activities::pending_for_subject(
        Subject::User(auth.user_id),
        &auth.actor(),
        &state.deps,
    )
    .await?;
    ok("Pending memberships retrieved successfully", data)
}

/// POST /getUserConfirmedMemberships
pub async fn user_confirmed_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    let data = activities::confirmed_for_subject(
        Subject::User(auth.user_id),
        &auth.actor(),
        &state.deps,
    )
    .await?;
    ok("Confirmed memberships retrieved successfully", data)
}

/// POST /getUserMemberships
pub async fn owner_inbox_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    match activities::owner_inbox(&auth.actor(), &state.deps).await? {
        Some(data) => ok("Pending user memberships retrieved successfully", data),
        None => ok(
            "No memberships found because user does not own any pages",
            Vec::<()>::new(),
        ),
    }
}

/// POST /getCompaniesMemberships
pub async fn user_invitations_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    let data =
        activities::invitations_for(Subject::User(auth.user_id), &auth.actor(), &state.deps)
            .await?;
    ok("Pending invitations retrieved successfully", data)
}

/// POST /getCompanyInvitations
pub async fn page_invitations_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<PageIdBody>, JsonRejection>,
) -> HandlerResult {
    let page_id = json_body(body)?.page_id()?;
    let data =
        activities::invitations_for(Subject::Page(page_id), &auth.actor(), &state.deps).await?;

    if data.is_empty() {
        return Ok(failure(StatusCode::NOT_FOUND, "No pending invitations found"));
    }
    ok("Pending invitations retrieved successfully", data)
}

/// POST /getUserApprovedMemberships
pub async fn page_members_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    body: Result<Json<PageIdBody>, JsonRejection>,
) -> HandlerResult {
    let page_id = json_body(body)?.page_id()?;
    let members = activities::page_members(page_id, &state.deps).await?;
    ok("Approved members retrieved successfully", members)
}

/// POST /getCompanyAffiliations
pub async fn affiliations_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    body: Result<Json<PageIdBody>, JsonRejection>,
) -> HandlerResult {
    let page_id = json_body(body)?.page_id()?;
    let data = activities::affiliations_of(page_id, &state.deps).await?;
    ok("Company affiliations retrieved successfully", data)
}

/// GET /getAffiliationsCompanies
pub async fn verified_companies_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    let pages = activities::verified_companies(&auth.actor(), &state.deps).await?;
    ok("Verified companies retrieved successfully", pages)
}

/// GET /checkverifiedMembershipbadge
pub async fn verified_badge_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    let verified = activities::has_verified_badge(&auth.actor(), &state.deps).await?;
    ok(
        "Verification badge status retrieved successfully",
        serde_json::json!({ "verified": verified }),
    )
}

/// POST /getcompanies
pub async fn browse_companies_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<PagingBody>>,
) -> HandlerResult {
    let paging = body.map(|Json(body)| body).unwrap_or_default();
    let request = PageRequest::new(
        paging.page,
        paging.per_page,
        activities::BROWSE_COMPANIES_PER_PAGE,
    );

    let pages = activities::browse_companies(&auth.actor(), request, &state.deps).await?;
    ok("Companies retrieved successfully", pages)
}

/// POST /getCompaniesandUsers
pub async fn invite_candidates_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<PagingBody>, JsonRejection>,
) -> HandlerResult {
    let paging = json_body(body)?;
    let page_id = required(paging.page_id, "page_id").map(PageId::new)?;
    let request = PageRequest::new(
        paging.page,
        paging.per_page,
        activities::INVITE_CANDIDATES_PER_PAGE,
    );

    let listing =
        activities::invite_candidates(page_id, &auth.actor(), request, &state.deps).await?;

    info!(page_id = %page_id, pages = listing.pages.total, users = listing.users.total, "Invite candidates listed");
    ok("Pages and users retrieved successfully", listing)
}
