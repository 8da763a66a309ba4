//! Typed ID definitions for all domain entities.
//!
//! ```rust
//! use affiliation_core::common::{MembershipId, PageId};
//!
//! let page_id = PageId::new(3);
//! let membership_id = MembershipId::new(3);
//!
//! // Same raw value, incompatible types:
//! // let wrong: PageId = membership_id;
//! # let _ = (page_id, membership_id);
//! ```

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for personal user accounts.
pub struct User;

/// Marker type for pages (companies, brands).
pub struct Page;

/// Marker type for membership claims.
pub struct Membership;

/// Marker type for documents attached to a membership.
pub struct MembershipDocument;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for User entities.
pub type UserId = Id<User>;

/// Typed ID for Page entities.
pub type PageId = Id<Page>;

/// Typed ID for Membership entities.
pub type MembershipId = Id<Membership>;

/// Typed ID for MembershipDocument entities.
pub type DocumentId = Id<MembershipDocument>;
