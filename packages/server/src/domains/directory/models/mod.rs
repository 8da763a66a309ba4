pub mod page;
pub mod user;

pub use page::PageSummary;
pub use user::UserSummary;
