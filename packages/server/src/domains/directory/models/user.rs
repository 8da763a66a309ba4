use serde::{Deserialize, Serialize};

use crate::common::UserId;

/// Public profile fields shown on member cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub profile_photo: Option<String>,
    pub cover_photo: Option<String>,
    pub headline: Option<String>,
    pub verified: bool,
}
