//! Postgres implementations of the membership store and directory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{BaseDirectory, BaseMembershipStore};
use crate::common::{MembershipId, PageId, UserId};
use crate::domains::directory::{PageSummary, UserSummary};
use crate::domains::membership::models::{
    InsertOutcome, Membership, MembershipDetails, MembershipDocument, MembershipFilter,
    MembershipStatus, NewDocument, NewMembership, Subject,
};

// =============================================================================
// Membership store
// =============================================================================

#[derive(Clone)]
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseMembershipStore for PostgresMembershipStore {
    async fn insert(&self, membership: NewMembership) -> Result<InsertOutcome> {
        let details = membership.details.normalized();

        // The partial unique index decides duplicates, so concurrent requests
        // for the same pair cannot both create a row.
        let created = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (
                subject_kind, subject_id, page_id,
                company_name, job_title, location,
                start_date, end_date, currently_working, responsibilities,
                status, initiated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', $11)
            ON CONFLICT (subject_kind, subject_id, page_id) WHERE status <> 'rejected'
            DO NOTHING
            RETURNING *
            "#,
        )
        .bind(membership.subject.kind())
        .bind(membership.subject.raw_id())
        .bind(membership.page_id)
        .bind(&details.company_name)
        .bind(&details.job_title)
        .bind(&details.location)
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(details.currently_working)
        .bind(&details.responsibilities)
        .bind(membership.initiated_by)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to insert membership")?;

        if let Some(created) = created {
            return Ok(InsertOutcome::Created(created));
        }

        let existing = self
            .find_active_for_pair(membership.subject, membership.page_id)
            .await?
            .context("Insert conflicted but no live membership exists for the pair")?;

        Ok(InsertOutcome::Duplicate(existing))
    }

    async fn find(&self, id: MembershipId) -> Result<Option<Membership>> {
        sqlx::query_as::<_, Membership>("SELECT * FROM memberships WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load membership")
    }

    async fn find_active_for_pair(
        &self,
        subject: Subject,
        page_id: PageId,
    ) -> Result<Option<Membership>> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT * FROM memberships
            WHERE subject_kind = $1 AND subject_id = $2 AND page_id = $3
              AND status <> 'rejected'
            "#,
        )
        .bind(subject.kind())
        .bind(subject.raw_id())
        .bind(page_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load membership for pair")
    }

    async fn update_details(
        &self,
        id: MembershipId,
        expected: MembershipStatus,
        details: &MembershipDetails,
    ) -> Result<Option<Membership>> {
        let details = details.clone().normalized();

        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET company_name = $3,
                job_title = $4,
                location = $5,
                start_date = $6,
                end_date = $7,
                currently_working = $8,
                responsibilities = $9,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(&details.company_name)
        .bind(&details.job_title)
        .bind(&details.location)
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(details.currently_working)
        .bind(&details.responsibilities)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update membership details")
    }

    async fn transition(
        &self,
        id: MembershipId,
        from: MembershipStatus,
        to: MembershipStatus,
    ) -> Result<Option<Membership>> {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update membership status")
    }

    async fn delete(&self, id: MembershipId) -> Result<Option<Vec<MembershipDocument>>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let documents = sqlx::query_as::<_, MembershipDocument>(
            "DELETE FROM membership_documents WHERE membership_id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to delete membership documents")?;

        let deleted = sqlx::query_scalar::<_, MembershipId>(
            "DELETE FROM memberships WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to delete membership")?;

        if deleted.is_none() {
            tx.rollback().await.context("Failed to roll back delete")?;
            return Ok(None);
        }

        tx.commit().await.context("Failed to commit delete")?;
        Ok(Some(documents))
    }

    async fn documents(&self, id: MembershipId) -> Result<Vec<MembershipDocument>> {
        sqlx::query_as::<_, MembershipDocument>(
            "SELECT * FROM membership_documents WHERE membership_id = $1 ORDER BY kind",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load membership documents")
    }

    async fn upsert_document(
        &self,
        document: NewDocument,
    ) -> Result<(MembershipDocument, Option<MembershipDocument>)> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // Concurrent writers for one membership queue on its row
        let locked = sqlx::query_scalar::<_, MembershipId>(
            "SELECT id FROM memberships WHERE id = $1 FOR UPDATE",
        )
        .bind(document.membership_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock membership")?;
        if locked.is_none() {
            anyhow::bail!("Membership {} does not exist", document.membership_id);
        }

        let previous = sqlx::query_as::<_, MembershipDocument>(
            "DELETE FROM membership_documents WHERE membership_id = $1 AND kind = $2 RETURNING *",
        )
        .bind(document.membership_id)
        .bind(document.kind)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to remove previous document")?;

        let stored = sqlx::query_as::<_, MembershipDocument>(
            r#"
            INSERT INTO membership_documents (
                membership_id, kind, path, original_name, content_type,
                size_bytes, uploaded_by, uploaded_by_user
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(document.membership_id)
        .bind(document.kind)
        .bind(&document.path)
        .bind(&document.original_name)
        .bind(&document.content_type)
        .bind(document.size_bytes)
        .bind(document.uploaded_by)
        .bind(document.uploaded_by_user)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to store document")?;

        tx.commit().await.context("Failed to commit document")?;
        Ok((stored, previous))
    }

    async fn list(&self, filter: &MembershipFilter) -> Result<Vec<Membership>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM memberships WHERE TRUE");

        if let Some(subject) = filter.subject {
            query
                .push(" AND subject_kind = ")
                .push_bind(subject.kind())
                .push(" AND subject_id = ")
                .push_bind(subject.raw_id());
        }

        if let Some(page_ids) = &filter.page_ids {
            let ids: Vec<i64> = page_ids.iter().map(|id| id.get()).collect();
            query.push(" AND page_id = ANY(").push_bind(ids).push(")");
        }

        if !filter.statuses.is_empty() {
            let statuses: Vec<String> = filter
                .statuses
                .iter()
                .map(|status| status.as_str().to_string())
                .collect();
            query
                .push(" AND status::text = ANY(")
                .push_bind(statuses)
                .push(")");
        }

        if let Some(initiated_by) = filter.initiated_by {
            query.push(" AND initiated_by = ").push_bind(initiated_by);
        }

        query.push(" ORDER BY created_at DESC, id DESC");

        query
            .build_query_as::<Membership>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list memberships")
    }
}

// =============================================================================
// Directory
// =============================================================================

#[derive(Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PAGE_COLUMNS: &str =
    "id, owner_id, page_name, page_description, page_profile_photo, page_cover_photo";

const USER_COLUMNS: &str = "id, name, email, profile_photo, cover_photo, headline, verified";

#[async_trait]
impl BaseDirectory for PostgresDirectory {
    async fn find_page(&self, id: PageId) -> Result<Option<PageSummary>> {
        sqlx::query_as::<_, PageSummary>(&format!(
            "SELECT {} FROM pages WHERE id = $1",
            PAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load page")
    }

    async fn find_pages(&self, ids: &[PageId]) -> Result<Vec<PageSummary>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        sqlx::query_as::<_, PageSummary>(&format!(
            "SELECT {} FROM pages WHERE id = ANY($1) ORDER BY id",
            PAGE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load pages")
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user")
    }

    async fn find_users(&self, ids: &[UserId]) -> Result<Vec<UserSummary>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1) ORDER BY id",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load users")
    }

    async fn pages_owned_by(&self, owner: UserId) -> Result<Vec<PageSummary>> {
        sqlx::query_as::<_, PageSummary>(&format!(
            "SELECT {} FROM pages WHERE owner_id = $1 ORDER BY id",
            PAGE_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load owned pages")
    }

    async fn list_pages(
        &self,
        exclude: &[PageId],
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PageSummary>, i64)> {
        let exclude: Vec<i64> = exclude.iter().map(|id| id.get()).collect();

        let rows = sqlx::query_as::<_, PageSummary>(&format!(
            "SELECT {} FROM pages WHERE NOT (id = ANY($1)) ORDER BY id LIMIT $2 OFFSET $3",
            PAGE_COLUMNS
        ))
        .bind(&exclude)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pages")?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pages WHERE NOT (id = ANY($1))")
                .bind(&exclude)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count pages")?;

        Ok((rows, total))
    }

    async fn list_users(
        &self,
        exclude: &[UserId],
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserSummary>, i64)> {
        let exclude: Vec<i64> = exclude.iter().map(|id| id.get()).collect();

        let rows = sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {} FROM users WHERE NOT (id = ANY($1)) ORDER BY id LIMIT $2 OFFSET $3",
            USER_COLUMNS
        ))
        .bind(&exclude)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE NOT (id = ANY($1))")
                .bind(&exclude)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count users")?;

        Ok((rows, total))
    }
}
