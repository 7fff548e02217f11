pub mod board;
pub mod column;
pub mod intent;
pub mod item;
pub mod position;
pub mod snapshot;

pub use board::{Board, BoardId};
pub use column::{Column, ColumnId};
pub use intent::MoveIntent;
pub use item::{Item, ItemId};
pub use position::{position_for_slot, reindexed_positions, SlotPosition};
pub use snapshot::BoardSnapshot;
