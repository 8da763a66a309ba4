//! Membership domain - claimed employment links between users/pages and company pages
//!
//! Workflow:
//!   subject requests (or company proposes) → counterparty approves →
//!   platform admin verifies. Anyone involved may reject before that.
//!
//! Layers:
//! - `models`     rows and enums
//! - `machine`    the transition table (pure)
//! - `guard`      who may do what (pure)
//! - `activities` operations composing guard + stores
//! - `data`       client input and response views

pub mod activities;
pub mod data;
pub mod error;
pub mod guard;
pub mod machine;
pub mod models;

pub use error::{FieldErrors, MembershipError, MembershipResult};
pub use guard::{Standing, Transition, TransitionGuard};
pub use machine::{next_status, MembershipAction};
pub use models::{
    DocumentKind, InitiatedBy, Membership, MembershipDetails, MembershipDocument,
    MembershipStatus, Subject, SubjectKind, UploadedFile, UploaderParty,
};
