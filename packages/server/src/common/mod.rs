// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod id;
pub mod pagination;

pub use auth::{Actor, AuthError};
pub use entity_ids::*;
pub use id::Id;
pub use pagination::{PageRequest, Paginated};
