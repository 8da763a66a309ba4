use serde::Serialize;

use crate::common::{MembershipId, PageId, Paginated};
use crate::domains::directory::{PageSummary, UserSummary};
use crate::domains::membership::models::{
    Membership, MembershipDocument, MembershipStatus, SubjectKind,
};

/// Membership with its documents and target page
#[derive(Debug, Clone, Serialize)]
pub struct MembershipData {
    #[serde(flatten)]
    pub membership: Membership,
    pub documents: Vec<MembershipDocument>,
    pub page: Option<PageSummary>,
}

/// Answer to a new membership request
#[derive(Debug, Clone, Serialize)]
pub struct RequestReceipt {
    pub membership_id: MembershipId,
    pub status: MembershipStatus,
    pub company_name: String,
    pub page_id: PageId,
}

impl From<&Membership> for RequestReceipt {
    fn from(membership: &Membership) -> Self {
        Self {
            membership_id: membership.id,
            status: membership.status,
            company_name: membership.company_name.clone(),
            page_id: membership.page_id,
        }
    }
}

/// Verified memberships of a subject, by who started them
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedMemberships {
    pub requested: Vec<MembershipData>,
    pub proposed: Vec<MembershipData>,
}

/// One verified member of a company page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberCard {
    pub membership_id: MembershipId,
    #[serde(rename = "type")]
    pub subject_type: SubjectKind,
    pub subject_id: i64,
    pub name: String,
    pub job_title: String,
    pub profile_photo: Option<String>,
    pub cover_photo: Option<String>,
    pub headline: Option<String>,
    pub verified: bool,
}

impl MemberCard {
    pub fn for_user(membership: &Membership, user: &UserSummary) -> Self {
        Self {
            membership_id: membership.id,
            subject_type: SubjectKind::User,
            subject_id: user.id.get(),
            name: user.name.clone(),
            job_title: membership.job_title.clone(),
            profile_photo: user.profile_photo.clone(),
            cover_photo: user.cover_photo.clone(),
            headline: user.headline.clone(),
            verified: user.verified,
        }
    }

    pub fn for_page(membership: &Membership, page: &PageSummary) -> Self {
        Self {
            membership_id: membership.id,
            subject_type: SubjectKind::Page,
            subject_id: page.id.get(),
            name: page.page_name.clone(),
            job_title: membership.job_title.clone(),
            profile_photo: page.page_profile_photo.clone(),
            cover_photo: page.page_cover_photo.clone(),
            headline: page.page_description.clone(),
            verified: false,
        }
    }
}

/// Pages and users a company page could still invite
#[derive(Debug, Clone, Serialize)]
pub struct CandidateListing {
    pub pages: Paginated<PageSummary>,
    pub users: Paginated<UserSummary>,
}
