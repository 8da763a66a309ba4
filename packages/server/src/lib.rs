// Affiliation service - API Core
//
// Backend for the membership verification workflow between users, pages and
// company pages: requests, company approval, admin verification, documents.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
