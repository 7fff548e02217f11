use corkboard_domain::{BoardSnapshot, ColumnId, ItemId};

use crate::remote::RemoteError;

/// Events the engine broadcasts to the rendering layer. `Changed`
/// fires after every committed mutation (optimistic apply, preview
/// reshuffle, confirm with differing values, rollback, reload);
/// `MoveRejected` fires exactly once per rolled-back move and carries
/// enough for the caller to show feedback and decide on a retry.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    Changed(BoardSnapshot),
    MoveRejected {
        item_id: ItemId,
        to_column_id: ColumnId,
        error: RemoteError,
    },
}
