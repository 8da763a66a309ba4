use thiserror::Error;

/// Authorization errors raised before any membership rule is evaluated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Admin access required")]
    AdminRequired,

    #[error("Invalid or expired token")]
    InvalidToken,
}
