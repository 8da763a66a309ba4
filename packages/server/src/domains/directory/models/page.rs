use serde::{Deserialize, Serialize};

use crate::common::{PageId, UserId};

/// Company / brand page as seen by the membership workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageSummary {
    pub id: PageId,
    pub owner_id: UserId,
    pub page_name: String,
    pub page_description: Option<String>,
    pub page_profile_photo: Option<String>,
    pub page_cover_photo: Option<String>,
}

impl PageSummary {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership() {
        let page = PageSummary {
            id: PageId::new(3),
            owner_id: UserId::new(11),
            page_name: "Acme".to_string(),
            page_description: None,
            page_profile_photo: None,
            page_cover_photo: None,
        };
        assert!(page.is_owned_by(UserId::new(11)));
        assert!(!page.is_owned_by(UserId::new(7)));
    }
}
