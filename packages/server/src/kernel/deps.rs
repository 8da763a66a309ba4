//! Server dependencies for membership activities (using traits for testability)
//!
//! This module provides the central dependency container used by all
//! activities. Every external resource sits behind a `Base*` trait so tests
//! can swap in the in-memory implementations from `test_dependencies`.

use std::sync::Arc;

use sqlx::PgPool;

use crate::kernel::{
    BaseBlobStore, BaseDirectory, BaseMembershipStore, LocalBlobStore, PostgresDirectory,
    PostgresMembershipStore,
};

/// Dependencies shared by every request
#[derive(Clone)]
pub struct ServerDeps {
    pub memberships: Arc<dyn BaseMembershipStore>,
    pub directory: Arc<dyn BaseDirectory>,
    pub blobs: Arc<dyn BaseBlobStore>,
    /// Largest accepted document upload, in bytes
    pub max_upload_bytes: usize,
}

impl ServerDeps {
    pub fn new(
        memberships: Arc<dyn BaseMembershipStore>,
        directory: Arc<dyn BaseDirectory>,
        blobs: Arc<dyn BaseBlobStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            memberships,
            directory,
            blobs,
            max_upload_bytes,
        }
    }

    /// Production wiring: Postgres for rows, local disk for files
    pub fn postgres(pool: PgPool, blobs: LocalBlobStore, max_upload_bytes: usize) -> Self {
        Self::new(
            Arc::new(PostgresMembershipStore::new(pool.clone())),
            Arc::new(PostgresDirectory::new(pool)),
            Arc::new(blobs),
            max_upload_bytes,
        )
    }
}
