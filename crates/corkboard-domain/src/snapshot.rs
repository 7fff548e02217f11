//! Point-in-time capture of one board.
//!
//! `BoardSnapshot` is the rollback target for optimistic mutations:
//! the store captures one before every apply, and the reconciliation
//! protocol restores it when a persistence call fails. It is also the
//! shape the remote store hands back on a full reload, and it
//! serializes for export/import. Pure data, no engine dependencies.

use serde::{Deserialize, Serialize};

use corkboard_core::{EngineError, EngineResult};

use crate::{Board, Column, Item};

/// Immutable copy of a board's columns and items at a point in time.
///
/// Column order in `columns` is the board's display order. Collection
/// fields use `#[serde(default)]` so partial documents (an empty
/// board, an older export) still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board: Board,

    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub items: Vec<Item>,
}

impl BoardSnapshot {
    pub fn new(board: Board, columns: Vec<Column>, items: Vec<Item>) -> Self {
        Self {
            board,
            columns,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.items.is_empty()
    }

    /// Serialize for export.
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    /// Deserialize a previously exported snapshot.
    pub fn from_json(data: &str) -> EngineResult<Self> {
        serde_json::from_str(data).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_roundtrip() {
        let board = Board::new("Test Board".to_string());
        let column = Column::new(board.id, "Todo".to_string());
        let item = Item::new(column.id, "Task".to_string(), 1024);
        let snapshot = BoardSnapshot::new(board, vec![column], vec![item]);

        let json = snapshot.to_json().unwrap();
        let restored = BoardSnapshot::from_json(&json).unwrap();

        assert_eq!(restored, snapshot);
    }

    #[test]
    fn partial_document_defaults_collections() {
        let board = Board::new("Bare".to_string());
        let json = format!(
            r#"{{"board": {}}}"#,
            serde_json::to_string(&board).unwrap()
        );

        let snapshot = BoardSnapshot::from_json(&json).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.board.name, "Bare");
    }

    #[test]
    fn malformed_document_is_a_serialization_error() {
        let err = BoardSnapshot::from_json("not json").unwrap_err();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
