//! Admin verification endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use super::envelope::{json_body, ok, HandlerResult};
use crate::common::MembershipId;
use crate::domains::membership::activities;
use crate::domains::membership::{FieldErrors, InitiatedBy, MembershipError};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct StatusBody {
    #[serde(alias = "id", alias = "membershipId")]
    pub membership_id: Option<i64>,
    pub status: Option<String>,
}

/// GET /getUserMembershipsForAdmin
pub async fn subject_queue_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    let data = activities::admin_queue(InitiatedBy::Subject, &auth.actor(), &state.deps).await?;
    ok("Memberships awaiting verification retrieved successfully", data)
}

/// GET /getCompanyMembershipsForAdmin
pub async fn company_queue_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> HandlerResult {
    let data = activities::admin_queue(InitiatedBy::Company, &auth.actor(), &state.deps).await?;
    ok("Memberships awaiting verification retrieved successfully", data)
}

/// POST /updateUserMembershipStatus and /updateCompanyMembershipStatus
pub async fn set_status_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> HandlerResult {
    let body = json_body(body)?;

    let mut errors = FieldErrors::new();
    if body.membership_id.is_none() {
        errors.add("membership_id", "The membership id field is required.");
    }
    if body.status.is_none() {
        errors.add("status", "The status field is required.");
    }
    let (Some(id), Some(status)) = (body.membership_id, body.status) else {
        return Err(MembershipError::Validation(errors));
    };

    let membership =
        activities::admin_set_status(MembershipId::new(id), &status, &auth.actor(), &state.deps)
            .await?;
    ok("Membership status updated successfully", membership)
}
