//! Caller-facing facade wiring the store, the drag coordinator, and
//! the reconciliation protocol to a remote store over tokio.
//!
//! All board state lives behind one lock; every mutation happens
//! under it, so reads never observe a half-applied move. The lock is
//! never held across an await: a drop releases it before the
//! persistence call is spawned, and the spawned task re-acquires it
//! only to feed the response back through the reconciler.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use corkboard_core::{EngineConfig, EngineError, EngineResult};
use corkboard_domain::{BoardId, BoardSnapshot, ItemId};

use crate::drag::{DragCoordinator, DropTarget};
use crate::events::BoardEvent;
use crate::reconcile::{DispatchedMove, Reconciler};
use crate::remote::RemoteStore;
use crate::store::{BoardStore, ColumnView};

struct EngineInner {
    store: BoardStore,
    drag: DragCoordinator,
    reconciler: Reconciler,
}

pub struct BoardEngine {
    inner: Arc<Mutex<EngineInner>>,
    remote: Arc<dyn RemoteStore>,
}

impl BoardEngine {
    pub fn new(snapshot: BoardSnapshot, remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_config(snapshot, remote, EngineConfig::default())
    }

    pub fn with_config(
        snapshot: BoardSnapshot,
        remote: Arc<dyn RemoteStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                store: BoardStore::new(snapshot, &config),
                drag: DragCoordinator::new(),
                reconciler: Reconciler::new(),
            })),
            remote,
        }
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, EngineInner>> {
        self.inner
            .lock()
            .map_err(|_| EngineError::Internal("engine state lock poisoned".to_string()))
    }

    /// Subscribe to board change and move rejection events.
    pub fn subscribe(&self) -> EngineResult<broadcast::Receiver<BoardEvent>> {
        Ok(self.lock()?.store.subscribe())
    }

    /// Columns in board order with their items sorted by position.
    pub fn read_model(&self) -> EngineResult<Vec<ColumnView>> {
        Ok(self.lock()?.store.read_model())
    }

    pub fn snapshot(&self) -> EngineResult<BoardSnapshot> {
        Ok(self.lock()?.store.snapshot())
    }

    pub fn has_pending_moves(&self) -> EngineResult<bool> {
        Ok(self.lock()?.reconciler.pending_count() > 0)
    }

    /// Begin a drag gesture for the given item.
    pub fn start_drag(&self, item_id: ItemId) -> EngineResult<()> {
        let mut inner = self.lock()?;
        let EngineInner { store, drag, .. } = &mut *inner;
        drag.start(store, item_id)
    }

    /// Update the drag preview for the current hover target.
    pub fn hover(&self, target: DropTarget) -> EngineResult<()> {
        let mut inner = self.lock()?;
        let EngineInner { store, drag, .. } = &mut *inner;
        drag.hover(store, &target)
    }

    /// Finish the gesture. A drop that actually moves the item is
    /// applied optimistically and persisted on a spawned task whose
    /// handle is returned so callers can await settlement; a no-op
    /// drop returns `None` and issues no persistence call.
    pub fn drop_on(&self, target: DropTarget) -> EngineResult<Option<JoinHandle<()>>> {
        let dispatched = {
            let mut inner = self.lock()?;
            let EngineInner {
                store,
                drag,
                reconciler,
            } = &mut *inner;
            match drag.drop_on(store, &target)? {
                Some(intent) => reconciler.begin(store, &intent)?,
                None => return Ok(None),
            }
        };
        Ok(Some(self.dispatch(dispatched)))
    }

    /// Abort the gesture and discard its preview. Persistence calls
    /// already dispatched by earlier drops are unaffected; the server
    /// has no concept of a drag session, only of discrete moves.
    pub fn cancel_drag(&self) -> EngineResult<()> {
        let mut inner = self.lock()?;
        let EngineInner { store, drag, .. } = &mut *inner;
        drag.cancel(store)
    }

    /// Refetch the board from the remote store and replace local
    /// state wholesale. In-flight moves are forgotten (their eventual
    /// responses resolve as stale) and any drag in progress is
    /// dropped.
    pub async fn reload(&self, board_id: BoardId) -> EngineResult<()> {
        let snapshot = self
            .remote
            .fetch_board(board_id)
            .await
            .map_err(EngineError::from)?;

        let mut inner = self.lock()?;
        inner.reconciler.clear();
        inner.drag.reset();
        inner.store.restore(snapshot);
        tracing::info!(%board_id, "board reloaded from remote");
        Ok(())
    }

    fn dispatch(&self, dispatched: DispatchedMove) -> JoinHandle<()> {
        let remote = Arc::clone(&self.remote);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = remote
                .move_item(
                    dispatched.item_id,
                    dispatched.to_column_id,
                    dispatched.position,
                )
                .await;

            let Ok(mut guard) = inner.lock() else {
                tracing::error!("engine state lock poisoned, dropping move response");
                return;
            };
            let EngineInner {
                store,
                drag,
                reconciler,
            } = &mut *guard;
            // A response may land mid-gesture for another item. The
            // preview is lifted while the resolution mutates confirmed
            // state, then replayed on top of the result; the gesture's
            // rollback anchor is rebased so it cannot resurrect the
            // state the resolution replaced.
            drag.suspend_preview(store);
            match outcome {
                Ok(receipt) => {
                    if let Err(error) = reconciler.resolve_success(
                        store,
                        dispatched.item_id,
                        dispatched.request_id,
                        &receipt,
                    ) {
                        tracing::error!(
                            item_id = %dispatched.item_id,
                            %error,
                            "failed to confirm move"
                        );
                    }
                }
                Err(error) => {
                    reconciler.resolve_failure(
                        store,
                        dispatched.item_id,
                        dispatched.request_id,
                        &error,
                    );
                }
            }
            drag.resume_preview(store);
        })
    }
}

impl From<crate::remote::RemoteError> for EngineError {
    fn from(error: crate::remote::RemoteError) -> Self {
        match error {
            crate::remote::RemoteError::Transport(msg) => EngineError::Transport(msg),
            crate::remote::RemoteError::Rejected(msg) => EngineError::Rejected(msg),
        }
    }
}
