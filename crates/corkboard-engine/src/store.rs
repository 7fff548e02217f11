//! Authoritative in-memory board state.
//!
//! Holds the current (possibly optimistic) board and provides atomic
//! read/mutate operations. All mutations are synchronous; subscribers
//! are notified after a mutation is fully applied, so a read never
//! observes a partial move. Rollback and preview bookkeeping go
//! through whole-snapshot restores.

use tokio::sync::broadcast;

use corkboard_core::{EngineConfig, EngineError, EngineResult};
use corkboard_domain::{
    position_for_slot, reindexed_positions, Board, BoardSnapshot, Column, ColumnId, Item, ItemId,
    MoveIntent, SlotPosition,
};

use crate::events::BoardEvent;
use crate::remote::RemoteError;

/// One column of the read model: the column plus its items sorted
/// ascending by position.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    pub column: Column,
    pub items: Vec<Item>,
}

/// Result of an optimistic apply: the snapshot taken immediately
/// before any mutation (the rollback target) and the position key the
/// assigner chose (what gets sent to the remote store).
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub snapshot_before: BoardSnapshot,
    pub position: i64,
}

#[derive(Debug)]
pub struct BoardStore {
    board: Board,
    columns: Vec<Column>,
    items: Vec<Item>,
    spacing: i64,
    events: broadcast::Sender<BoardEvent>,
}

impl BoardStore {
    pub fn new(snapshot: BoardSnapshot, config: &EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            board: snapshot.board,
            columns: snapshot.columns,
            items: snapshot.items,
            spacing: config.position_spacing.max(2),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::new(self.board.clone(), self.columns.clone(), self.items.clone())
    }

    /// Columns in board order, each carrying its items sorted
    /// ascending by position.
    ///
    /// Panics if two items in one column share a position: duplicates
    /// must never be visible to a render, so reaching one here is an
    /// engine bug, not a runtime condition.
    pub fn read_model(&self) -> Vec<ColumnView> {
        self.columns
            .iter()
            .map(|column| {
                let items = self.ordered_items(column.id, None);
                assert!(
                    items.windows(2).all(|w| w[0].position != w[1].position),
                    "duplicate position rendered in column {}",
                    column.id
                );
                ColumnView {
                    column: column.clone(),
                    items,
                }
            })
            .collect()
    }

    /// Items of one column sorted by position, optionally with one
    /// item (the one being moved) left out.
    pub fn ordered_items(&self, column_id: ColumnId, exclude: Option<ItemId>) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|i| i.column_id == column_id && Some(i.id) != exclude)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.position);
        items
    }

    fn ordered_positions(&self, column_id: ColumnId, exclude: Option<ItemId>) -> Vec<i64> {
        let mut positions: Vec<i64> = self
            .items
            .iter()
            .filter(|i| i.column_id == column_id && Some(i.id) != exclude)
            .map(|i| i.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Number of items in a column, optionally excluding one. The
    /// append slot for a drop onto a bare column.
    pub fn item_count(&self, column_id: ColumnId, exclude: Option<ItemId>) -> usize {
        self.items
            .iter()
            .filter(|i| i.column_id == column_id && Some(i.id) != exclude)
            .count()
    }

    /// The item's current slot index within its own column.
    pub fn slot_of(&self, item_id: ItemId) -> EngineResult<usize> {
        let item = self
            .item(item_id)
            .ok_or_else(|| EngineError::NotFound(format!("item {item_id}")))?;
        let ordered = self.ordered_items(item.column_id, None);
        ordered
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| EngineError::Internal(format!("item {item_id} missing from its column")))
    }

    /// Optimistically apply a move: snapshot, remove the item from its
    /// source ordering, insert it at the requested slot of the
    /// destination with a key from the position assigner (reindexing
    /// the destination column first when the gap is exhausted), and
    /// notify subscribers.
    pub fn apply_move(&mut self, intent: &MoveIntent) -> EngineResult<AppliedMove> {
        let item = self
            .item(intent.item_id)
            .ok_or_else(|| EngineError::NotFound(format!("item {}", intent.item_id)))?;
        if item.column_id != intent.from_column_id {
            return Err(EngineError::Validation(format!(
                "stale intent: item {} is no longer in column {}",
                intent.item_id, intent.from_column_id
            )));
        }
        if self.column(intent.to_column_id).is_none() {
            return Err(EngineError::NotFound(format!(
                "column {}",
                intent.to_column_id
            )));
        }

        let neighbor_count = self.item_count(intent.to_column_id, Some(intent.item_id));
        if intent.to_slot > neighbor_count {
            return Err(EngineError::Validation(format!(
                "slot {} out of range for column {}",
                intent.to_slot, intent.to_column_id
            )));
        }

        // Rollback target: the state before any mutation, including a
        // reindex of the destination column.
        let snapshot_before = self.snapshot();

        let positions = self.ordered_positions(intent.to_column_id, Some(intent.item_id));
        let position = match position_for_slot(&positions, intent.to_slot, self.spacing) {
            SlotPosition::At(key) => key,
            SlotPosition::NeedsReindex => {
                self.reindex_column(intent.to_column_id, Some(intent.item_id));
                let positions = self.ordered_positions(intent.to_column_id, Some(intent.item_id));
                match position_for_slot(&positions, intent.to_slot, self.spacing) {
                    SlotPosition::At(key) => key,
                    SlotPosition::NeedsReindex => {
                        return Err(EngineError::Internal(format!(
                            "reindex of column {} did not open a gap at slot {}",
                            intent.to_column_id, intent.to_slot
                        )));
                    }
                }
            }
        };

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == intent.item_id)
            .ok_or_else(|| EngineError::Internal(format!("item {} vanished", intent.item_id)))?;
        item.move_to_column(intent.to_column_id, position);

        tracing::debug!(
            item_id = %intent.item_id,
            to_column_id = %intent.to_column_id,
            to_slot = intent.to_slot,
            position,
            "applied move"
        );
        self.emit_changed();

        Ok(AppliedMove {
            snapshot_before,
            position,
        })
    }

    /// Wholesale replacement with a previously captured snapshot, with
    /// notification. Used by the reconciliation protocol on rollback
    /// and by drag cancellation.
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        self.restore_quiet(snapshot);
        tracing::debug!(board_id = %self.board.id, "restored snapshot");
        self.emit_changed();
    }

    /// Replacement without notification, for preview bookkeeping where
    /// the restore is immediately followed by another apply.
    pub(crate) fn restore_quiet(&mut self, snapshot: BoardSnapshot) {
        self.board = snapshot.board;
        self.columns = snapshot.columns;
        self.items = snapshot.items;
    }

    /// Reconcile the optimistic placement with the server-canonical
    /// one. A match is a no-op (no event, no visual jump); differing
    /// values are adopted silently and subscribers are told to
    /// re-render. If the adopted key collides with a neighbor the
    /// column is reindexed so duplicates are never visible.
    pub fn confirm_move(
        &mut self,
        item_id: ItemId,
        column_id: ColumnId,
        position: i64,
    ) -> EngineResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| EngineError::NotFound(format!("item {item_id}")))?;

        if item.column_id == column_id && item.position == position {
            return Ok(());
        }

        item.move_to_column(column_id, position);
        if self.has_duplicate_positions(column_id) {
            self.reindex_column(column_id, None);
        }

        tracing::debug!(%item_id, %column_id, position, "adopted server-canonical placement");
        self.emit_changed();
        Ok(())
    }

    fn has_duplicate_positions(&self, column_id: ColumnId) -> bool {
        let positions = self.ordered_positions(column_id, None);
        positions.windows(2).any(|w| w[0] == w[1])
    }

    /// Reassign every item in the column an evenly spaced key in
    /// current visual order. Relative order is preserved (the sort is
    /// stable); only the absolute keys change.
    ///
    /// Panics if the column holds two items with the same id, which
    /// means the store is corrupted.
    fn reindex_column(&mut self, column_id: ColumnId, exclude: Option<ItemId>) {
        let mut indices: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, i)| i.column_id == column_id && Some(i.id) != exclude)
            .map(|(idx, _)| idx)
            .collect();
        indices.sort_by_key(|&idx| self.items[idx].position);

        let mut seen = std::collections::HashSet::new();
        for &idx in &indices {
            assert!(
                seen.insert(self.items[idx].id),
                "duplicate item id {} in column {}",
                self.items[idx].id,
                column_id
            );
        }

        let keys = reindexed_positions(indices.len(), self.spacing);
        for (&idx, key) in indices.iter().zip(keys) {
            self.items[idx].position = key;
        }

        tracing::debug!(%column_id, count = indices.len(), "reindexed column");
    }

    pub(crate) fn emit_changed(&self) {
        // Send fails only when no renderer is subscribed, which is fine.
        let _ = self.events.send(BoardEvent::Changed(self.snapshot()));
    }

    pub(crate) fn emit_move_rejected(
        &self,
        item_id: ItemId,
        to_column_id: ColumnId,
        error: RemoteError,
    ) {
        let _ = self.events.send(BoardEvent::MoveRejected {
            item_id,
            to_column_id,
            error,
        });
    }
}
