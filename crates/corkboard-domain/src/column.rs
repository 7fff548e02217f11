use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::BoardId;

pub type ColumnId = Uuid;

/// A named ordered bucket of items. Display metadata (color, width)
/// is opaque to the engine. A column's id is unique within its board
/// and stable for the board's lifetime within a session; column order
/// is the order columns appear in the board snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<u16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Column {
    pub fn new(board_id: BoardId, label: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_id,
            label,
            color: None,
            width: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_label(&mut self, label: String) {
        self.label = label;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_label_touches_timestamp() {
        let mut column = Column::new(Uuid::new_v4(), "Todo".to_string());
        let created = column.updated_at;

        column.update_label("In Progress".to_string());
        assert_eq!(column.label, "In Progress");
        assert!(column.updated_at >= created);
    }
}
