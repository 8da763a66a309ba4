//! Test fixtures for creating directory rows.
//!
//! Ids come from the database sequences so tests sharing the container never
//! collide.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

use affiliation_core::common::{PageId, UserId};
use affiliation_core::domains::membership::MembershipDetails;

/// Create a user with a unique email
pub async fn create_test_user(pool: &PgPool, name: &str) -> Result<UserId> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(format!("{}@example.com", uuid::Uuid::new_v4()))
    .fetch_one(pool)
    .await?;

    Ok(UserId::new(id))
}

/// Create a page owned by `owner`
pub async fn create_test_page(pool: &PgPool, owner: UserId, name: &str) -> Result<PageId> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO pages (owner_id, page_name) VALUES ($1, $2) RETURNING id",
    )
    .bind(owner.get())
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(PageId::new(id))
}

/// Details for a current "Engineer" position
pub fn engineer_details(company_name: &str) -> MembershipDetails {
    MembershipDetails::builder()
        .company_name(company_name)
        .job_title("Engineer")
        .location("Lahore")
        .start_date(NaiveDate::from_ymd_opt(2021, 3, 1).unwrap())
        .build()
}
