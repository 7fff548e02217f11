//! Reconciliation between optimistic local state and the remote store.
//!
//! Every committed intent is applied locally first, then persisted
//! asynchronously. Responses are fenced by a monotonic request id: per
//! item, only the response matching the most recently issued id may
//! confirm state or trigger a rollback; earlier responses are silently
//! discarded, so an out-of-order network response can never clobber a
//! newer optimistic state.

use std::collections::HashMap;

use corkboard_core::EngineResult;
use corkboard_domain::{BoardSnapshot, ColumnId, ItemId, MoveIntent};

use crate::remote::{MoveReceipt, RemoteError};
use crate::store::BoardStore;

/// Bookkeeping for one in-flight persistence call. At most one exists
/// per item id; a newer intent for the same item supersedes it.
#[derive(Debug)]
pub struct PendingMove {
    pub item_id: ItemId,
    pub request_id: u64,
    pub to_column_id: ColumnId,
    /// Rollback target. When a move supersedes an in-flight one, the
    /// superseded move's target is inherited, so a chain of rapid
    /// moves rolls all the way back to the last server-confirmed
    /// state, never to an intermediate optimistic one.
    pub snapshot_before: BoardSnapshot,
}

/// What the engine must send to the remote store for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedMove {
    pub item_id: ItemId,
    pub request_id: u64,
    pub to_column_id: ColumnId,
    pub position: i64,
}

/// How a remote response was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The latest request for the item; local state was confirmed.
    Confirmed,
    /// The latest request failed; local state was rolled back and the
    /// rejection surfaced.
    RolledBack,
    /// A superseded request; the response was discarded.
    Stale,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    next_request_id: u64,
    pending: HashMap<ItemId, PendingMove>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self, item_id: ItemId) -> bool {
        self.pending.contains_key(&item_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Optimistically apply an intent and register the persistence
    /// call to be issued. If a call is already in flight for this
    /// item it is superseded: its eventual response becomes stale and
    /// its rollback snapshot is threaded into the new pending move.
    pub fn begin(
        &mut self,
        store: &mut BoardStore,
        intent: &MoveIntent,
    ) -> EngineResult<DispatchedMove> {
        let applied = store.apply_move(intent)?;

        self.next_request_id += 1;
        let request_id = self.next_request_id;

        let snapshot_before = match self.pending.remove(&intent.item_id) {
            Some(superseded) => {
                tracing::debug!(
                    item_id = %intent.item_id,
                    superseded = superseded.request_id,
                    request_id,
                    "superseding in-flight move"
                );
                superseded.snapshot_before
            }
            None => applied.snapshot_before,
        };

        self.pending.insert(
            intent.item_id,
            PendingMove {
                item_id: intent.item_id,
                request_id,
                to_column_id: intent.to_column_id,
                snapshot_before,
            },
        );

        Ok(DispatchedMove {
            item_id: intent.item_id,
            request_id,
            to_column_id: intent.to_column_id,
            position: applied.position,
        })
    }

    /// Handle a success response. Confirms the optimistic placement
    /// with server-canonical values when the response matches the
    /// latest pending request for the item; otherwise the response is
    /// stale and discarded, since the later request's response is the
    /// authoritative one.
    pub fn resolve_success(
        &mut self,
        store: &mut BoardStore,
        item_id: ItemId,
        request_id: u64,
        receipt: &MoveReceipt,
    ) -> EngineResult<Resolution> {
        match self.pending.get(&item_id) {
            Some(pending) if pending.request_id == request_id => {
                store.confirm_move(item_id, receipt.column_id, receipt.position)?;
                self.pending.remove(&item_id);
                tracing::debug!(%item_id, request_id, "move confirmed");
                Ok(Resolution::Confirmed)
            }
            _ => {
                tracing::debug!(%item_id, request_id, "discarding stale success response");
                Ok(Resolution::Stale)
            }
        }
    }

    /// Handle a failure response. Rolls back to the pending move's
    /// snapshot and surfaces the rejection when the response matches
    /// the latest pending request; a stale failure is discarded
    /// silently, since rolling back would revert correct newer state.
    pub fn resolve_failure(
        &mut self,
        store: &mut BoardStore,
        item_id: ItemId,
        request_id: u64,
        error: &RemoteError,
    ) -> Resolution {
        let is_latest = self
            .pending
            .get(&item_id)
            .is_some_and(|p| p.request_id == request_id);
        if !is_latest {
            tracing::debug!(%item_id, request_id, "discarding stale failure response");
            return Resolution::Stale;
        }

        let Some(pending) = self.pending.remove(&item_id) else {
            return Resolution::Stale;
        };
        tracing::warn!(
            %item_id,
            request_id,
            %error,
            "move failed, rolling back"
        );
        store.restore(pending.snapshot_before);
        store.emit_move_rejected(item_id, pending.to_column_id, error.clone());
        Resolution::RolledBack
    }

    /// Forget all in-flight moves. Used on a full reload; any response
    /// that arrives afterwards resolves as stale.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corkboard_core::EngineConfig;
    use corkboard_domain::{Board, Column, Item};

    use crate::events::BoardEvent;

    struct Fixture {
        store: BoardStore,
        todo: ColumnId,
        doing: ColumnId,
        done: ColumnId,
        item: ItemId,
    }

    fn fixture() -> Fixture {
        let board = Board::new("Test".to_string());
        let todo = Column::new(board.id, "Todo".to_string());
        let doing = Column::new(board.id, "Doing".to_string());
        let done = Column::new(board.id, "Done".to_string());
        let item = Item::new(todo.id, "X".to_string(), 1024);
        let (todo_id, doing_id, done_id, item_id) = (todo.id, doing.id, done.id, item.id);
        let snapshot = BoardSnapshot::new(board, vec![todo, doing, done], vec![item]);
        Fixture {
            store: BoardStore::new(snapshot, &EngineConfig::default()),
            todo: todo_id,
            doing: doing_id,
            done: done_id,
            item: item_id,
        }
    }

    fn receipt(fx: &Fixture, column_id: ColumnId, position: i64) -> MoveReceipt {
        MoveReceipt {
            item_id: fx.item,
            column_id,
            position,
        }
    }

    #[test]
    fn success_confirms_and_clears_the_pending_move() {
        let mut fx = fixture();
        let mut reconciler = Reconciler::new();

        let intent = MoveIntent::new(fx.item, fx.todo, fx.done, 0);
        let dispatched = reconciler.begin(&mut fx.store, &intent).unwrap();
        assert!(reconciler.has_pending(fx.item));

        let done_receipt = receipt(&fx, fx.done, dispatched.position);
        let resolution = reconciler
            .resolve_success(&mut fx.store, fx.item, dispatched.request_id, &done_receipt)
            .unwrap();

        assert_eq!(resolution, Resolution::Confirmed);
        assert!(!reconciler.has_pending(fx.item));
        assert_eq!(fx.store.item(fx.item).unwrap().column_id, fx.done);
    }

    #[test]
    fn failure_rolls_back_to_the_exact_prior_state() {
        let mut fx = fixture();
        let mut reconciler = Reconciler::new();

        let before = fx.store.snapshot();
        let intent = MoveIntent::new(fx.item, fx.todo, fx.done, 0);
        let dispatched = reconciler.begin(&mut fx.store, &intent).unwrap();

        let resolution = reconciler.resolve_failure(
            &mut fx.store,
            fx.item,
            dispatched.request_id,
            &RemoteError::Transport("connection reset".to_string()),
        );

        assert_eq!(resolution, Resolution::RolledBack);
        assert_eq!(fx.store.snapshot(), before);
        assert!(!reconciler.has_pending(fx.item));
    }

    #[test]
    fn failure_surfaces_one_rejection_with_the_destination() {
        let mut fx = fixture();
        let mut reconciler = Reconciler::new();
        let mut events = fx.store.subscribe();

        let intent = MoveIntent::new(fx.item, fx.todo, fx.done, 0);
        let dispatched = reconciler.begin(&mut fx.store, &intent).unwrap();
        reconciler.resolve_failure(
            &mut fx.store,
            fx.item,
            dispatched.request_id,
            &RemoteError::Transport("timeout".to_string()),
        );

        let mut rejections = 0;
        while let Ok(event) = events.try_recv() {
            if let BoardEvent::MoveRejected {
                item_id,
                to_column_id,
                error,
            } = event
            {
                assert_eq!(item_id, fx.item);
                assert_eq!(to_column_id, fx.done);
                assert!(error.is_retryable());
                rejections += 1;
            }
        }
        assert_eq!(rejections, 1);
    }

    #[test]
    fn a_late_success_for_a_superseded_move_is_discarded() {
        let mut fx = fixture();
        let mut reconciler = Reconciler::new();

        // Move A (to Doing) then move B (to Done) before A resolves.
        let move_a = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.todo, fx.doing, 0))
            .unwrap();
        let move_b = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.doing, fx.done, 0))
            .unwrap();

        // B's response arrives first and confirms.
        let b_receipt = receipt(&fx, fx.done, move_b.position);
        let resolution = reconciler
            .resolve_success(&mut fx.store, fx.item, move_b.request_id, &b_receipt)
            .unwrap();
        assert_eq!(resolution, Resolution::Confirmed);

        // A's response arrives afterwards and must not alter state.
        let a_receipt = receipt(&fx, fx.doing, move_a.position);
        let resolution = reconciler
            .resolve_success(&mut fx.store, fx.item, move_a.request_id, &a_receipt)
            .unwrap();
        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(fx.store.item(fx.item).unwrap().column_id, fx.done);
    }

    #[test]
    fn a_stale_failure_is_discarded_silently() {
        let mut fx = fixture();
        let mut reconciler = Reconciler::new();

        let move_a = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.todo, fx.doing, 0))
            .unwrap();
        let move_b = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.doing, fx.done, 0))
            .unwrap();

        let mut events = fx.store.subscribe();
        let resolution = reconciler.resolve_failure(
            &mut fx.store,
            fx.item,
            move_a.request_id,
            &RemoteError::Transport("late timeout".to_string()),
        );

        // The newer move B is still in flight; nothing moves, nothing
        // is surfaced.
        assert_eq!(resolution, Resolution::Stale);
        assert!(events.try_recv().is_err());
        assert_eq!(fx.store.item(fx.item).unwrap().column_id, fx.done);
        assert!(reconciler.has_pending(fx.item));
        let _ = move_b;
    }

    #[test]
    fn a_superseding_chain_rolls_back_to_the_last_confirmed_state() {
        let mut fx = fixture();
        let mut reconciler = Reconciler::new();

        let confirmed = fx.store.snapshot();
        let move_a = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.todo, fx.doing, 0))
            .unwrap();
        let move_b = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.doing, fx.done, 0))
            .unwrap();

        // A is stale by now; B fails. The rollback lands on the state
        // before the whole chain, not on A's intermediate optimistic
        // state.
        reconciler.resolve_failure(
            &mut fx.store,
            fx.item,
            move_a.request_id,
            &RemoteError::Transport("dropped".to_string()),
        );
        let resolution = reconciler.resolve_failure(
            &mut fx.store,
            fx.item,
            move_b.request_id,
            &RemoteError::Rejected("column archived".to_string()),
        );

        assert_eq!(resolution, Resolution::RolledBack);
        assert_eq!(fx.store.snapshot(), confirmed);
    }

    #[test]
    fn request_ids_are_monotonic() {
        let mut fx = fixture();
        let mut reconciler = Reconciler::new();

        let move_a = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.todo, fx.doing, 0))
            .unwrap();
        let move_b = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.doing, fx.done, 0))
            .unwrap();

        assert!(move_b.request_id > move_a.request_id);
    }

    #[test]
    fn moves_of_different_items_are_independent() {
        let mut fx = fixture();
        let other = Item::new(fx.todo, "Y".to_string(), 2048);
        let other_id = other.id;
        let mut snapshot = fx.store.snapshot();
        snapshot.items.push(other);
        fx.store.restore(snapshot);

        let mut reconciler = Reconciler::new();
        let move_x = reconciler
            .begin(&mut fx.store, &MoveIntent::new(fx.item, fx.todo, fx.done, 0))
            .unwrap();
        let move_y = reconciler
            .begin(&mut fx.store, &MoveIntent::new(other_id, fx.todo, fx.doing, 0))
            .unwrap();
        assert_eq!(reconciler.pending_count(), 2);

        // Y fails; X is untouched and still pending.
        reconciler.resolve_failure(
            &mut fx.store,
            other_id,
            move_y.request_id,
            &RemoteError::Transport("reset".to_string()),
        );
        assert!(reconciler.has_pending(fx.item));
        assert!(!reconciler.has_pending(other_id));
        assert_eq!(fx.store.item(fx.item).unwrap().column_id, fx.done);
        let _ = move_x;
    }
}
