//! Drag session state machine.
//!
//! Owns the lifecycle of a single pointer-driven gesture:
//! `Idle → Dragging → {Dropped, Cancelled} → Idle`. Hover updates
//! reshuffle the store as a visual preview without touching the
//! network; only a drop finalizes the preview into at most one
//! [`MoveIntent`], and only if it actually moves the item. The caller
//! translates pointer geometry (which item, which side of its
//! midpoint) into a [`DropTarget`]; the engine owns no geometry.

use corkboard_core::{EngineError, EngineResult};
use corkboard_domain::{BoardSnapshot, ColumnId, ItemId, MoveIntent};

use crate::store::BoardStore;

/// Which side of the hovered item's midpoint the pointer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertEdge {
    Before,
    After,
}

/// What the pointer is currently over. Hovering a column means
/// append-to-end; hovering an item means insert before or after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Column(ColumnId),
    Item { item_id: ItemId, edge: InsertEdge },
}

#[derive(Debug)]
pub struct DragContext {
    item_id: ItemId,
    origin_column_id: ColumnId,
    origin_slot: usize,
    pre_drag: BoardSnapshot,
    preview_slot: Option<(ColumnId, usize)>,
    previewed: bool,
}

#[derive(Debug, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragContext),
}

#[derive(Debug, Default)]
pub struct DragCoordinator {
    state: DragState,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Begin a gesture: record the item's origin and the pre-drag
    /// snapshot that every preview (and a cancel) restores.
    pub fn start(&mut self, store: &BoardStore, item_id: ItemId) -> EngineResult<()> {
        if self.is_dragging() {
            return Err(EngineError::Validation(
                "a drag gesture is already in progress".to_string(),
            ));
        }
        let item = store
            .item(item_id)
            .ok_or_else(|| EngineError::NotFound(format!("item {item_id}")))?;
        let origin_column_id = item.column_id;
        let origin_slot = store.slot_of(item_id)?;

        tracing::debug!(%item_id, %origin_column_id, origin_slot, "drag started");
        self.state = DragState::Dragging(DragContext {
            item_id,
            origin_column_id,
            origin_slot,
            pre_drag: store.snapshot(),
            preview_slot: None,
            previewed: false,
        });
        Ok(())
    }

    /// Update the preview for the current hover target. The store is
    /// reset to the pre-drag snapshot and the item re-placed at the
    /// resolved slot, so repeated hovers never accumulate reshuffles.
    /// A hover over the slot already previewed is ignored.
    pub fn hover(&mut self, store: &mut BoardStore, target: &DropTarget) -> EngineResult<()> {
        let ctx = match &mut self.state {
            DragState::Dragging(ctx) => ctx,
            DragState::Idle => {
                return Err(EngineError::Validation(
                    "no drag gesture in progress".to_string(),
                ));
            }
        };

        let slot = resolve_slot(store, ctx, target)?;
        if ctx.preview_slot == Some(slot) {
            return Ok(());
        }
        ctx.preview_slot = Some(slot);

        store.restore_quiet(ctx.pre_drag.clone());
        let (to_column_id, to_slot) = slot;
        if to_column_id == ctx.origin_column_id && to_slot == ctx.origin_slot {
            // Back over the item's own slot: the restore already undid
            // the previous preview, just tell the renderer.
            if ctx.previewed {
                ctx.previewed = false;
                store.emit_changed();
            }
            return Ok(());
        }

        let intent = MoveIntent::new(ctx.item_id, ctx.origin_column_id, to_column_id, to_slot);
        store.apply_move(&intent)?;
        ctx.previewed = true;
        Ok(())
    }

    /// Finalize the gesture. Returns the single committed intent, or
    /// `None` when the drop resolves to the item's current column and
    /// slot (no persistence call, no event beyond what was already
    /// rendered). Either way the coordinator returns to `Idle` and the
    /// store is left at the pre-drag state; applying the returned
    /// intent is the reconciliation protocol's job.
    pub fn drop_on(
        &mut self,
        store: &mut BoardStore,
        target: &DropTarget,
    ) -> EngineResult<Option<MoveIntent>> {
        let ctx = match std::mem::take(&mut self.state) {
            DragState::Dragging(ctx) => ctx,
            DragState::Idle => {
                return Err(EngineError::Validation(
                    "no drag gesture in progress".to_string(),
                ));
            }
        };

        let (to_column_id, to_slot) = resolve_slot(store, &ctx, target)?;
        store.restore_quiet(ctx.pre_drag);

        if to_column_id == ctx.origin_column_id && to_slot == ctx.origin_slot {
            tracing::debug!(item_id = %ctx.item_id, "drop was a no-op");
            if ctx.previewed {
                store.emit_changed();
            }
            return Ok(None);
        }

        tracing::debug!(
            item_id = %ctx.item_id,
            %to_column_id,
            to_slot,
            "drop committed"
        );
        Ok(Some(MoveIntent::new(
            ctx.item_id,
            ctx.origin_column_id,
            to_column_id,
            to_slot,
        )))
    }

    /// Abort the gesture, discarding any preview reshuffle by
    /// restoring the pre-drag snapshot. A no-op when idle, since
    /// pointer-escape and focus loss can fire at any time. Does not
    /// touch persistence calls already dispatched by earlier drops.
    pub fn cancel(&mut self, store: &mut BoardStore) -> EngineResult<()> {
        let ctx = match std::mem::take(&mut self.state) {
            DragState::Dragging(ctx) => ctx,
            DragState::Idle => return Ok(()),
        };

        tracing::debug!(item_id = %ctx.item_id, "drag cancelled");
        if ctx.previewed {
            store.restore(ctx.pre_drag);
        }
        Ok(())
    }

    /// Drop any gesture without restoring, for full reloads where the
    /// store is about to be replaced wholesale anyway.
    pub(crate) fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    /// Unwind the preview so a remote response can be resolved against
    /// confirmed state. Paired with [`DragCoordinator::resume_preview`].
    pub(crate) fn suspend_preview(&mut self, store: &mut BoardStore) {
        if let DragState::Dragging(ctx) = &self.state {
            if ctx.previewed {
                store.restore_quiet(ctx.pre_drag.clone());
            }
        }
    }

    /// Re-anchor the gesture on whatever the resolution left behind
    /// and replay the preview on top of it. The pre-drag snapshot is
    /// replaced with the post-resolution state, so later hovers and
    /// the final drop can never reinstate a board image that a
    /// rollback or a server-canonical confirm has overwritten.
    pub(crate) fn resume_preview(&mut self, store: &mut BoardStore) {
        let item_id = match &self.state {
            DragState::Dragging(ctx) => ctx.item_id,
            DragState::Idle => return,
        };
        let origin = match (store.item(item_id), store.slot_of(item_id)) {
            (Some(item), Ok(slot)) => (item.column_id, slot),
            _ => {
                tracing::debug!(%item_id, "dragged item gone, ending gesture");
                self.state = DragState::Idle;
                return;
            }
        };

        let DragState::Dragging(ctx) = &mut self.state else {
            return;
        };
        ctx.origin_column_id = origin.0;
        ctx.origin_slot = origin.1;
        ctx.pre_drag = store.snapshot();
        ctx.previewed = false;

        let Some((to_column_id, to_slot)) = ctx.preview_slot else {
            return;
        };
        // The target column may have shrunk under the gesture.
        let to_slot = to_slot.min(store.item_count(to_column_id, Some(item_id)));
        ctx.preview_slot = Some((to_column_id, to_slot));
        if to_column_id == ctx.origin_column_id && to_slot == ctx.origin_slot {
            return;
        }

        let intent = MoveIntent::new(item_id, ctx.origin_column_id, to_column_id, to_slot);
        if let Err(error) = store.apply_move(&intent) {
            tracing::debug!(%item_id, %error, "preview no longer applies, discarding it");
            ctx.preview_slot = None;
            store.emit_changed();
            return;
        }
        ctx.previewed = true;
    }
}

/// Resolve a hover/drop target to a `(column, slot)` pair, with the
/// dragged item excluded from the slot arithmetic so the same target
/// means the same slot whether or not a preview is currently applied.
fn resolve_slot(
    store: &BoardStore,
    ctx: &DragContext,
    target: &DropTarget,
) -> EngineResult<(ColumnId, usize)> {
    match *target {
        DropTarget::Column(column_id) => {
            if store.column(column_id).is_none() {
                return Err(EngineError::NotFound(format!("column {column_id}")));
            }
            Ok((column_id, store.item_count(column_id, Some(ctx.item_id))))
        }
        DropTarget::Item { item_id, edge } => {
            if item_id == ctx.item_id {
                // Hovering the dragged item itself: its own slot.
                return Ok((ctx.origin_column_id, ctx.origin_slot));
            }
            let over = store
                .item(item_id)
                .ok_or_else(|| EngineError::NotFound(format!("item {item_id}")))?;
            let ordered = store.ordered_items(over.column_id, Some(ctx.item_id));
            let index = ordered
                .iter()
                .position(|i| i.id == item_id)
                .ok_or_else(|| {
                    EngineError::Internal(format!("item {item_id} missing from its column"))
                })?;
            let slot = match edge {
                InsertEdge::Before => index,
                InsertEdge::After => index + 1,
            };
            Ok((over.column_id, slot))
        }
    }
}
