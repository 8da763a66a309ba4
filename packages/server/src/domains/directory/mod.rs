//! Directory domain - read-only view of users and pages
//!
//! Profiles are owned elsewhere on the platform. Memberships only need to know
//! who owns a page and how to render a person or a company on a card.

pub mod models;

pub use models::{PageSummary, UserSummary};
