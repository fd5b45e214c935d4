use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemId;

/// One viewing of a catalog item by a user
///
/// `item_id` is a weak reference: the item may since have been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_id: String,
    pub item_id: ItemId,
    pub viewed_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn now(user_id: impl Into<String>, item_id: ItemId) -> Self {
        Self {
            user_id: user_id.into(),
            item_id,
            viewed_at: Utc::now(),
        }
    }
}
