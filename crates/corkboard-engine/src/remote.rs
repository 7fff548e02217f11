//! Contract with the remote resource store.
//!
//! Abstract, not wire-level: the concrete binding in the surrounding
//! system is JSON over HTTPS, but the engine must not assume that.
//! Transport timeouts are the implementor's concern and surface here
//! as [`RemoteError::Transport`].

use async_trait::async_trait;
use thiserror::Error;

use corkboard_domain::{BoardId, BoardSnapshot, ColumnId, ItemId};

/// Why a persistence call did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The call never reached the remote store. Retryable; the engine
    /// rolls back locally and leaves the retry decision to the caller.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote store refused the move (destination gone, policy
    /// violation). Not retryable without a new intent.
    #[error("move rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

/// Server-canonical placement returned by a successful move, in case
/// the server resolved a race with another client differently than
/// the optimistic local apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReceipt {
    pub item_id: ItemId,
    pub column_id: ColumnId,
    pub position: i64,
}

/// The one interface the engine consumes from its environment.
///
/// `move_item` must be idempotent enough that a retried call with the
/// same final destination produces the same canonical result, and
/// must not reorder unrelated items as a side effect.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn move_item(
        &self,
        item_id: ItemId,
        column_id: ColumnId,
        position: i64,
    ) -> Result<MoveReceipt, RemoteError>;

    /// Full reload, used only when the caller chooses to refresh from
    /// scratch rather than trust a rollback snapshot.
    async fn fetch_board(&self, board_id: BoardId) -> Result<BoardSnapshot, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_retryable() {
        assert!(RemoteError::Transport("connection reset".to_string()).is_retryable());
        assert!(!RemoteError::Rejected("column deleted".to_string()).is_retryable());
    }
}
