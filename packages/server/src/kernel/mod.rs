//! Kernel module - server infrastructure and dependencies.

pub mod blob_store;
pub mod deps;
pub mod postgres;
pub mod test_dependencies;
pub mod traits;

pub use blob_store::LocalBlobStore;
pub use deps::ServerDeps;
pub use postgres::{PostgresDirectory, PostgresMembershipStore};
pub use test_dependencies::{
    InMemoryBlobStore, InMemoryDirectory, InMemoryMembershipStore, TestDependencies,
};
pub use traits::*;
