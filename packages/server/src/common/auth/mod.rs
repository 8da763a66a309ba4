/// Caller identity for the affiliation service
///
/// Every activity receives an explicit [`Actor`]:
///
/// ```rust
/// use affiliation_core::common::{Actor, UserId};
///
/// let actor = Actor::new(UserId::new(7), false);
/// assert_eq!(actor.user_id().get(), 7);
/// ```
///
/// Whether an actor may act on a particular membership is decided by the
/// membership transition guard, not here.
mod actor;
mod errors;

pub use actor::Actor;
pub use errors::AuthError;
