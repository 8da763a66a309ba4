//! Auth domain - bearer token issue and verification
//!
//! Identity comes from an HS256 JWT. The token carries the user id and the
//! platform admin flag; handlers turn it into an explicit `Actor`.

pub mod jwt;

pub use jwt::{Claims, JwtService};
