//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::*;

/// Multipart overhead allowed on top of the two largest uploads
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    /// Absent when running on in-memory stores
    pub db_pool: Option<PgPool>,
}

fn membership_routes() -> Router<AppState> {
    Router::new()
        // Creating memberships
        .route("/requestmembership", post(request_membership_handler))
        .route(
            "/requestCompanyAffiliations",
            post(request_company_affiliation_handler),
        )
        .route(
            "/requestMembershipCompanySide",
            post(propose_membership_handler),
        )
        // Single membership
        .route("/getMembership/:id", post(get_membership_handler))
        .route("/updateMembership/:id", post(update_membership_handler))
        .route("/membershipDocuments/:id", post(attach_document_handler))
        .route("/approveMembership/:id", post(approve_handler))
        .route("/rejectMembership/:id", post(reject_handler))
        .route(
            "/storecompaniesresponses",
            post(store_company_response_handler),
        )
        .route(
            "/approvedCompanyInvitations",
            post(accept_invitation_handler),
        )
        .route("/rejectCompanyInvitations", post(reject_invitation_handler))
        // Pair-addressed
        .route("/membershipstatususerside", post(pair_status_handler))
        .route("/cancelMembershipRequest", post(cancel_request_handler))
        .route("/cancelmembership", post(cancel_membership_handler))
        .route("/removemember", post(remove_member_handler))
        .route(
            "/removeCompanyMembership",
            post(remove_company_membership_handler),
        )
        // Listings
        .route("/getUserPendingMemberships", post(user_pending_handler))
        .route("/getUserConfirmedMemberships", post(user_confirmed_handler))
        .route("/getUserMemberships", post(owner_inbox_handler))
        .route("/getCompaniesMemberships", post(user_invitations_handler))
        .route("/getCompanyInvitations", post(page_invitations_handler))
        .route("/getUserApprovedMemberships", post(page_members_handler))
        .route("/getCompanyAffiliations", post(affiliations_handler))
        .route("/getAffiliationsCompanies", get(verified_companies_handler))
        .route(
            "/checkverifiedMembershipbadge",
            get(verified_badge_handler),
        )
        .route("/getcompanies", post(browse_companies_handler))
        .route("/getCompaniesandUsers", post(invite_candidates_handler))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/getUserMembershipsForAdmin", get(subject_queue_handler))
        .route(
            "/getCompanyMembershipsForAdmin",
            get(company_queue_handler),
        )
        .route("/updateUserMembershipStatus", post(set_status_handler))
        .route("/updateCompanyMembershipStatus", post(set_status_handler))
}

/// Build the Axum application router
///
/// Every membership route needs a valid JWT; handlers answer 401 when the
/// middleware found none. `/health` is public.
pub fn build_app(
    deps: ServerDeps,
    jwt_service: Arc<JwtService>,
    db_pool: Option<PgPool>,
    request_timeout: Duration,
) -> Router {
    let body_limit = deps.max_upload_bytes * 2 + FORM_OVERHEAD_BYTES;

    let state = AppState {
        deps: Arc::new(deps),
        db_pool,
    };

    // CORS configuration - allow any origin, the API is token-authenticated
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .merge(membership_routes())
        .merge(admin_routes())
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
