use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::common::{MembershipId, PageId, UserId};

// ============================================================================
// Enums
// ============================================================================

/// Where a membership is in the approval workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Requested by one side, waiting for the counterparty
    Pending,
    /// Counterparty confirmed, waiting for a platform admin
    CompanyApproved,
    /// Verified by a platform admin (terminal)
    AdminVerified,
    /// Rejected by anyone involved (terminal)
    Rejected,
}

impl MembershipStatus {
    pub const ALL: [MembershipStatus; 4] = [
        MembershipStatus::Pending,
        MembershipStatus::CompanyApproved,
        MembershipStatus::AdminVerified,
        MembershipStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::CompanyApproved => "company_approved",
            MembershipStatus::AdminVerified => "admin_verified",
            MembershipStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MembershipStatus::AdminVerified | MembershipStatus::Rejected
        )
    }

    /// Counts towards the one-live-membership-per-pair rule
    pub fn is_active(&self) -> bool {
        !matches!(self, MembershipStatus::Rejected)
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(MembershipStatus::Pending),
            "company_approved" => Ok(MembershipStatus::CompanyApproved),
            "admin_verified" => Ok(MembershipStatus::AdminVerified),
            "rejected" => Ok(MembershipStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid membership status: {}", s)),
        }
    }
}

/// Kind of account claiming the membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subject_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    User,
    Page,
}

impl std::str::FromStr for SubjectKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(SubjectKind::User),
            "page" => Ok(SubjectKind::Page),
            _ => Err(anyhow::anyhow!("Invalid subject type: {}", s)),
        }
    }
}

/// Which side created the membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_initiator", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InitiatedBy {
    /// The subject asked to be recognised as a member
    Subject,
    /// The company page proposed the subject as a member
    Company,
}

// ============================================================================
// Subject
// ============================================================================

/// The user or page acting as "employee" of a company page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    User(UserId),
    Page(PageId),
}

impl Subject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::User(_) => SubjectKind::User,
            Subject::Page(_) => SubjectKind::Page,
        }
    }

    /// Raw key stored in `memberships.subject_id`
    pub fn raw_id(&self) -> i64 {
        match self {
            Subject::User(id) => id.get(),
            Subject::Page(id) => id.get(),
        }
    }

    pub fn from_parts(kind: SubjectKind, raw_id: i64) -> Self {
        match kind {
            SubjectKind::User => Subject::User(UserId::new(raw_id)),
            SubjectKind::Page => Subject::Page(PageId::new(raw_id)),
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::User(id) => write!(f, "user:{}", id),
            Subject::Page(id) => write!(f, "page:{}", id),
        }
    }
}

// ============================================================================
// Membership
// ============================================================================

/// Membership model - a claimed employment link between a subject and a company page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: MembershipId,

    // Parties
    pub subject_kind: SubjectKind,
    pub subject_id: i64,
    pub page_id: PageId,

    // Claimed position
    pub company_name: String,
    pub job_title: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub currently_working: bool,
    pub responsibilities: Option<String>,

    // Approval workflow
    pub status: MembershipStatus,
    pub initiated_by: InitiatedBy,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn subject(&self) -> Subject {
        Subject::from_parts(self.subject_kind, self.subject_id)
    }

    pub fn details(&self) -> MembershipDetails {
        MembershipDetails {
            company_name: self.company_name.clone(),
            job_title: self.job_title.clone(),
            location: self.location.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            currently_working: self.currently_working,
            responsibilities: self.responsibilities.clone(),
        }
    }
}

/// Editable part of a membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct MembershipDetails {
    pub company_name: String,
    pub job_title: String,
    pub location: String,
    pub start_date: NaiveDate,
    #[builder(default, setter(strip_option))]
    pub end_date: Option<NaiveDate>,
    #[builder(default = true)]
    pub currently_working: bool,
    #[builder(default, setter(strip_option))]
    pub responsibilities: Option<String>,
}

impl MembershipDetails {
    /// An end date only exists for positions that are over.
    pub fn normalized(mut self) -> Self {
        if self.currently_working {
            self.end_date = None;
        }
        self
    }
}

/// Input for creating a membership
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub subject: Subject,
    pub page_id: PageId,
    pub details: MembershipDetails,
    pub initiated_by: InitiatedBy,
}

/// Result of an insert guarded by the one-live-membership-per-pair rule
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// A new pending membership was created
    Created(Membership),
    /// The pair already has a live membership, returned unchanged
    Duplicate(Membership),
}

/// Filter for membership listings. Empty `statuses` means any status.
#[derive(Debug, Clone, Default)]
pub struct MembershipFilter {
    pub subject: Option<Subject>,
    pub page_ids: Option<Vec<PageId>>,
    pub statuses: Vec<MembershipStatus>,
    pub initiated_by: Option<InitiatedBy>,
}

impl MembershipFilter {
    pub fn for_subject(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
            ..Self::default()
        }
    }

    pub fn for_pages(page_ids: Vec<PageId>) -> Self {
        Self {
            page_ids: Some(page_ids),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: &[MembershipStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn initiated_by(mut self, initiated_by: InitiatedBy) -> Self {
        self.initiated_by = Some(initiated_by);
        self
    }

    /// Same predicate the Postgres store builds in SQL
    pub fn matches(&self, membership: &Membership) -> bool {
        if let Some(subject) = self.subject {
            if membership.subject() != subject {
                return false;
            }
        }
        if let Some(page_ids) = &self.page_ids {
            if !page_ids.contains(&membership.page_id) {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&membership.status) {
            return false;
        }
        if let Some(initiated_by) = self.initiated_by {
            if membership.initiated_by != initiated_by {
                return false;
            }
        }
        true
    }
}
