use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::column::ColumnId;

pub type ItemId = Uuid;

/// The unit being ordered: a task card. `position` is an orderable
/// key, monotonically comparable within a column, not required to be
/// contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub column_id: ColumnId,
    pub title: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(column_id: ColumnId, title: String, position: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            column_id,
            title,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn move_to_column(&mut self, column_id: ColumnId, position: i64) {
        self.column_id = column_id;
        self.position = position;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_updates_column_and_position() {
        let source = Uuid::new_v4();
        let target = Uuid::new_v4();
        let mut item = Item::new(source, "Write report".to_string(), 1024);

        item.move_to_column(target, 2048);
        assert_eq!(item.column_id, target);
        assert_eq!(item.position, 2048);
    }
}
