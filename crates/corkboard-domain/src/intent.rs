use serde::{Deserialize, Serialize};

use crate::column::ColumnId;
use crate::item::ItemId;

/// A single requested relocation of one item, produced per drag
/// gesture and consumed once. `to_slot` is the visual slot index
/// within the destination column, counted with the moved item
/// excluded; the concrete position key is derived by the position
/// assigner when the intent is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub item_id: ItemId,
    pub from_column_id: ColumnId,
    pub to_column_id: ColumnId,
    pub to_slot: usize,
}

impl MoveIntent {
    pub fn new(
        item_id: ItemId,
        from_column_id: ColumnId,
        to_column_id: ColumnId,
        to_slot: usize,
    ) -> Self {
        Self {
            item_id,
            from_column_id,
            to_column_id,
            to_slot,
        }
    }
}
