//! Board-ordering engine for kanban-style task boards.
//!
//! Maintains a consistent user-visible ordering of items across named
//! columns while a drag-and-drop gesture is in progress, and
//! reconciles the locally-mutated ordering with an authoritative
//! remote store that may reject, reorder, or fail to apply a change.
//!
//! Layered leaves-first:
//! - [`store::BoardStore`] — authoritative in-memory board state with
//!   atomic mutation primitives and a subscription read model.
//! - [`drag::DragCoordinator`] — the pointer-gesture state machine
//!   that turns hover/drop input into at most one [`MoveIntent`] per
//!   gesture.
//! - [`reconcile::Reconciler`] — optimistic apply, request fencing by
//!   monotonic id, and rollback on failure.
//! - [`engine::BoardEngine`] — the caller-facing facade that wires
//!   the three to a [`remote::RemoteStore`] over tokio.

pub mod drag;
pub mod engine;
pub mod events;
pub mod reconcile;
pub mod remote;
pub mod store;

pub use drag::{DragCoordinator, DragState, DropTarget, InsertEdge};
pub use engine::BoardEngine;
pub use events::BoardEvent;
pub use reconcile::{DispatchedMove, PendingMove, Reconciler, Resolution};
pub use remote::{MoveReceipt, RemoteError, RemoteStore};
pub use store::{AppliedMove, BoardStore, ColumnView};

pub use corkboard_domain::MoveIntent;
