// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Who may do what lives in the membership domain (guard + activities).
//
// Naming convention: Base* for trait names (e.g., BaseMembershipStore, BaseBlobStore)

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::common::{MembershipId, PageId, UserId};
use crate::domains::directory::{PageSummary, UserSummary};
use crate::domains::membership::models::{
    InsertOutcome, Membership, MembershipDetails, MembershipDocument, MembershipFilter,
    MembershipStatus, NewDocument, NewMembership, Subject,
};

// =============================================================================
// Membership Store Trait (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseMembershipStore: Send + Sync {
    /// Insert a pending membership unless the pair already has a live one
    async fn insert(&self, membership: NewMembership) -> Result<InsertOutcome>;

    async fn find(&self, id: MembershipId) -> Result<Option<Membership>>;

    /// The non-rejected membership of a (subject, page) pair, if any
    async fn find_active_for_pair(
        &self,
        subject: Subject,
        page_id: PageId,
    ) -> Result<Option<Membership>>;

    /// Overwrite the details while the status is still `expected`.
    /// Returns None when the row is gone or its status moved.
    async fn update_details(
        &self,
        id: MembershipId,
        expected: MembershipStatus,
        details: &MembershipDetails,
    ) -> Result<Option<Membership>>;

    /// Compare-and-set on status. Returns None when the status was not `from`.
    async fn transition(
        &self,
        id: MembershipId,
        from: MembershipStatus,
        to: MembershipStatus,
    ) -> Result<Option<Membership>>;

    /// Delete a membership with its document rows.
    /// Returns the removed documents so their files can be deleted, None if absent.
    async fn delete(&self, id: MembershipId) -> Result<Option<Vec<MembershipDocument>>>;

    async fn documents(&self, id: MembershipId) -> Result<Vec<MembershipDocument>>;

    /// Store document metadata, replacing any document of the same kind.
    /// Returns the stored document and the one it replaced.
    async fn upsert_document(
        &self,
        document: NewDocument,
    ) -> Result<(MembershipDocument, Option<MembershipDocument>)>;

    /// Memberships matching the filter, newest first
    async fn list(&self, filter: &MembershipFilter) -> Result<Vec<Membership>>;
}

// =============================================================================
// Directory Trait (Infrastructure - read-only users and pages)
// =============================================================================

#[async_trait]
pub trait BaseDirectory: Send + Sync {
    async fn find_page(&self, id: PageId) -> Result<Option<PageSummary>>;

    async fn find_pages(&self, ids: &[PageId]) -> Result<Vec<PageSummary>>;

    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>>;

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<UserSummary>>;

    async fn pages_owned_by(&self, owner: UserId) -> Result<Vec<PageSummary>>;

    /// One page of pages ordered by id, skipping `exclude`. Returns (rows, total).
    async fn list_pages(
        &self,
        exclude: &[PageId],
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PageSummary>, i64)>;

    /// One page of users ordered by id, skipping `exclude`. Returns (rows, total).
    async fn list_users(
        &self,
        exclude: &[UserId],
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserSummary>, i64)>;
}

// =============================================================================
// Blob Store Trait (Infrastructure - uploaded files)
// =============================================================================

#[async_trait]
pub trait BaseBlobStore: Send + Sync {
    /// Write bytes at a relative path, creating parents as needed
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()>;

    /// Remove a file. Missing files are not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}
