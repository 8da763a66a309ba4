// TestDependencies - in-memory implementations for testing
//
// Provides stores that can be injected into ServerDeps for activity and router
// tests without a database.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::{BaseBlobStore, BaseDirectory, BaseMembershipStore, ServerDeps};
use crate::common::{DocumentId, MembershipId, PageId, UserId};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::domains::directory::{PageSummary, UserSummary};
use crate::domains::membership::models::{
    InsertOutcome, Membership, MembershipDetails, MembershipDocument, MembershipFilter,
    MembershipStatus, NewDocument, NewMembership, Subject,
};

// =============================================================================
// In-memory membership store
// =============================================================================

#[derive(Default)]
struct MembershipTables {
    memberships: BTreeMap<MembershipId, Membership>,
    documents: BTreeMap<DocumentId, MembershipDocument>,
    next_membership_id: i64,
    next_document_id: i64,
}

impl MembershipTables {
    fn live_for_pair(&self, subject: Subject, page_id: PageId) -> Option<&Membership> {
        self.memberships
            .values()
            .find(|m| m.subject() == subject && m.page_id == page_id && m.status.is_active())
    }
}

/// Membership store backed by a mutex-guarded map. The pair rule is checked
/// under the same lock as the insert.
#[derive(Default)]
pub struct InMemoryMembershipStore {
    tables: Mutex<MembershipTables>,
    /// Status another writer sets just before the next transition lands
    interleaved: Mutex<Option<MembershipStatus>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored membership, oldest first
    pub fn all(&self) -> Vec<Membership> {
        self.tables.lock().unwrap().memberships.values().cloned().collect()
    }

    /// Every stored document row
    pub fn all_documents(&self) -> Vec<MembershipDocument> {
        self.tables.lock().unwrap().documents.values().cloned().collect()
    }

    /// Make the next `transition` lose to a concurrent writer that moved the
    /// membership to `status` first
    pub fn interleave_next_transition(&self, status: MembershipStatus) {
        *self.interleaved.lock().unwrap() = Some(status);
    }
}

#[async_trait]
impl BaseMembershipStore for InMemoryMembershipStore {
    async fn insert(&self, membership: NewMembership) -> Result<InsertOutcome> {
        let mut tables = self.tables.lock().unwrap();

        if let Some(existing) = tables.live_for_pair(membership.subject, membership.page_id) {
            return Ok(InsertOutcome::Duplicate(existing.clone()));
        }

        tables.next_membership_id += 1;
        let id = MembershipId::new(tables.next_membership_id);
        let details = membership.details.normalized();
        let now = Utc::now();

        let created = Membership {
            id,
            subject_kind: membership.subject.kind(),
            subject_id: membership.subject.raw_id(),
            page_id: membership.page_id,
            company_name: details.company_name,
            job_title: details.job_title,
            location: details.location,
            start_date: details.start_date,
            end_date: details.end_date,
            currently_working: details.currently_working,
            responsibilities: details.responsibilities,
            status: MembershipStatus::Pending,
            initiated_by: membership.initiated_by,
            created_at: now,
            updated_at: now,
        };
        tables.memberships.insert(id, created.clone());

        Ok(InsertOutcome::Created(created))
    }

    async fn find(&self, id: MembershipId) -> Result<Option<Membership>> {
        Ok(self.tables.lock().unwrap().memberships.get(&id).cloned())
    }

    async fn find_active_for_pair(
        &self,
        subject: Subject,
        page_id: PageId,
    ) -> Result<Option<Membership>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .live_for_pair(subject, page_id)
            .cloned())
    }

    async fn update_details(
        &self,
        id: MembershipId,
        expected: MembershipStatus,
        details: &MembershipDetails,
    ) -> Result<Option<Membership>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(membership) = tables.memberships.get_mut(&id) else {
            return Ok(None);
        };
        if membership.status != expected {
            return Ok(None);
        }

        let details = details.clone().normalized();
        membership.company_name = details.company_name;
        membership.job_title = details.job_title;
        membership.location = details.location;
        membership.start_date = details.start_date;
        membership.end_date = details.end_date;
        membership.currently_working = details.currently_working;
        membership.responsibilities = details.responsibilities;
        membership.updated_at = Utc::now();

        Ok(Some(membership.clone()))
    }

    async fn transition(
        &self,
        id: MembershipId,
        from: MembershipStatus,
        to: MembershipStatus,
    ) -> Result<Option<Membership>> {
        let interleaved = self.interleaved.lock().unwrap().take();
        let mut tables = self.tables.lock().unwrap();
        if let (Some(status), Some(membership)) = (interleaved, tables.memberships.get_mut(&id)) {
            membership.status = status;
            membership.updated_at = Utc::now();
        }
        match tables.memberships.get_mut(&id) {
            Some(membership) if membership.status == from => {
                membership.status = to;
                membership.updated_at = Utc::now();
                Ok(Some(membership.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: MembershipId) -> Result<Option<Vec<MembershipDocument>>> {
        let mut tables = self.tables.lock().unwrap();
        if tables.memberships.remove(&id).is_none() {
            return Ok(None);
        }

        let removed: Vec<MembershipDocument> = tables
            .documents
            .values()
            .filter(|d| d.membership_id == id)
            .cloned()
            .collect();
        tables.documents.retain(|_, d| d.membership_id != id);

        Ok(Some(removed))
    }

    async fn documents(&self, id: MembershipId) -> Result<Vec<MembershipDocument>> {
        let mut documents: Vec<MembershipDocument> = self
            .tables
            .lock()
            .unwrap()
            .documents
            .values()
            .filter(|d| d.membership_id == id)
            .cloned()
            .collect();
        documents.sort_by_key(|d| d.kind.field_name());
        Ok(documents)
    }

    async fn upsert_document(
        &self,
        document: NewDocument,
    ) -> Result<(MembershipDocument, Option<MembershipDocument>)> {
        let mut tables = self.tables.lock().unwrap();

        if !tables.memberships.contains_key(&document.membership_id) {
            anyhow::bail!("Membership {} does not exist", document.membership_id);
        }

        let previous_id = tables
            .documents
            .values()
            .find(|d| d.membership_id == document.membership_id && d.kind == document.kind)
            .map(|d| d.id);
        let previous = previous_id.and_then(|id| tables.documents.remove(&id));

        tables.next_document_id += 1;
        let stored = MembershipDocument {
            id: DocumentId::new(tables.next_document_id),
            membership_id: document.membership_id,
            kind: document.kind,
            path: document.path,
            original_name: document.original_name,
            content_type: document.content_type,
            size_bytes: document.size_bytes,
            uploaded_by: document.uploaded_by,
            uploaded_by_user: document.uploaded_by_user,
            created_at: Utc::now(),
        };
        tables.documents.insert(stored.id, stored.clone());

        Ok((stored, previous))
    }

    async fn list(&self, filter: &MembershipFilter) -> Result<Vec<Membership>> {
        // Ids are assigned in creation order, so id order is creation order
        Ok(self
            .tables
            .lock()
            .unwrap()
            .memberships
            .values()
            .rev()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }
}

// =============================================================================
// In-memory directory
// =============================================================================

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<BTreeMap<UserId, UserSummary>>,
    pages: Mutex<BTreeMap<PageId, PageSummary>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: i64, name: &str) -> UserSummary {
        let user = UserSummary {
            id: UserId::new(id),
            name: name.to_string(),
            email: format!("user{}@example.com", id),
            profile_photo: None,
            cover_photo: None,
            headline: None,
            verified: false,
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        user
    }

    pub fn add_page(&self, id: i64, owner: i64, name: &str) -> PageSummary {
        let page = PageSummary {
            id: PageId::new(id),
            owner_id: UserId::new(owner),
            page_name: name.to_string(),
            page_description: None,
            page_profile_photo: None,
            page_cover_photo: None,
        };
        self.pages.lock().unwrap().insert(page.id, page.clone());
        page
    }
}

fn page_of<T: Clone>(rows: Vec<T>, limit: i64, offset: i64) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let rows = rows
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (rows, total)
}

#[async_trait]
impl BaseDirectory for InMemoryDirectory {
    async fn find_page(&self, id: PageId) -> Result<Option<PageSummary>> {
        Ok(self.pages.lock().unwrap().get(&id).cloned())
    }

    async fn find_pages(&self, ids: &[PageId]) -> Result<Vec<PageSummary>> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<UserSummary>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn pages_owned_by(&self, owner: UserId) -> Result<Vec<PageSummary>> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn list_pages(
        &self,
        exclude: &[PageId],
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PageSummary>, i64)> {
        let rows: Vec<PageSummary> = self
            .pages
            .lock()
            .unwrap()
            .values()
            .filter(|p| !exclude.contains(&p.id))
            .cloned()
            .collect();
        Ok(page_of(rows, limit, offset))
    }

    async fn list_users(
        &self,
        exclude: &[UserId],
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserSummary>, i64)> {
        let rows: Vec<UserSummary> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| !exclude.contains(&u.id))
            .cloned()
            .collect();
        Ok(page_of(rows, limit, offset))
    }
}

// =============================================================================
// In-memory blob store
// =============================================================================

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    fail_writes: Mutex<bool>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail
    pub fn failing_writes(self) -> Self {
        *self.fail_writes.lock().unwrap() = true;
        self
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }
}

#[async_trait]
impl BaseBlobStore for InMemoryBlobStore {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            anyhow::bail!("Blob store unavailable");
        }
        self.blobs.lock().unwrap().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub memberships: Arc<InMemoryMembershipStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub max_upload_bytes: usize,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            memberships: Arc::new(InMemoryMembershipStore::new()),
            directory: Arc::new(InMemoryDirectory::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Set a custom blob store
    pub fn mock_blobs(mut self, blobs: InMemoryBlobStore) -> Self {
        self.blobs = Arc::new(blobs);
        self
    }

    /// Set the upload size limit
    pub fn max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Add a user to the directory
    pub fn user(self, id: i64, name: &str) -> Self {
        self.directory.add_user(id, name);
        self
    }

    /// Add a page owned by `owner` to the directory
    pub fn page(self, id: i64, owner: i64, name: &str) -> Self {
        self.directory.add_page(id, owner, name);
        self
    }

    /// Build ServerDeps backed by these stores
    pub fn into_server_deps(self) -> ServerDeps {
        ServerDeps::new(
            self.memberships,
            self.directory,
            self.blobs,
            self.max_upload_bytes,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::membership::models::InitiatedBy;
    use chrono::NaiveDate;

    fn new_membership(subject: i64, page: i64) -> NewMembership {
        NewMembership {
            subject: Subject::User(UserId::new(subject)),
            page_id: PageId::new(page),
            details: MembershipDetails::builder()
                .company_name("Acme")
                .job_title("Engineer")
                .location("Remote")
                .start_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
                .build(),
            initiated_by: InitiatedBy::Subject,
        }
    }

    #[tokio::test]
    async fn test_pair_rule_under_lock() {
        let store = InMemoryMembershipStore::new();

        let first = store.insert(new_membership(7, 3)).await.unwrap();
        let InsertOutcome::Created(first) = first else {
            panic!("expected a new membership");
        };

        let second = store.insert(new_membership(7, 3)).await.unwrap();
        assert!(matches!(second, InsertOutcome::Duplicate(ref m) if m.id == first.id));

        store
            .transition(first.id, MembershipStatus::Pending, MembershipStatus::Rejected)
            .await
            .unwrap();
        let third = store.insert(new_membership(7, 3)).await.unwrap();
        assert!(matches!(third, InsertOutcome::Created(ref m) if m.id != first.id));
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let store = InMemoryMembershipStore::new();
        let InsertOutcome::Created(m) = store.insert(new_membership(7, 3)).await.unwrap() else {
            panic!("expected a new membership");
        };

        let stale = store
            .transition(
                m.id,
                MembershipStatus::CompanyApproved,
                MembershipStatus::AdminVerified,
            )
            .await
            .unwrap();
        assert!(stale.is_none());
        assert_eq!(
            store.find(m.id).await.unwrap().unwrap().status,
            MembershipStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_directory_paging() {
        let directory = InMemoryDirectory::new();
        for id in 1..=5 {
            directory.add_page(id, 100, &format!("Page {}", id));
        }

        let (rows, total) = directory
            .list_pages(&[PageId::new(2)], 2, 2)
            .await
            .unwrap();
        assert_eq!(total, 4);
        assert_eq!(
            rows.iter().map(|p| p.id.get()).collect::<Vec<_>>(),
            vec![4, 5]
        );
    }
}
