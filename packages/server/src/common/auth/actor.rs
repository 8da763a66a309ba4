use super::AuthError;
use crate::common::entity_ids::UserId;

/// The authenticated caller of an operation.
///
/// Handlers build one from the verified JWT and pass it explicitly to every
/// activity; nothing reads identity from ambient state.
///
/// ```
/// use affiliation_core::common::{Actor, UserId};
///
/// let actor = Actor::new(UserId::new(7), false);
/// assert!(actor.require_admin().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    is_admin: bool,
}

impl Actor {
    /// Create a new actor
    ///
    /// # Arguments
    /// * `user_id` - The user performing the call
    /// * `is_admin` - Admin flag from the JWT (already validated during authentication)
    pub fn new(user_id: UserId, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }

    /// Shorthand for a regular user
    pub fn user(user_id: UserId) -> Self {
        Self::new(user_id, false)
    }

    /// Shorthand for a platform admin
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, true)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Fail unless the actor is a platform admin
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AuthError::AdminRequired)
        }
    }
}
