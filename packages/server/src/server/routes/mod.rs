// HTTP routes
pub mod admin;
pub mod envelope;
pub mod form;
pub mod health;
pub mod memberships;

pub use admin::*;
pub use envelope::{ApiResponse, HandlerResult};
pub use health::*;
pub use memberships::*;
