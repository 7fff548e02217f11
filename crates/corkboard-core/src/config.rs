use serde::{Deserialize, Serialize};

/// Tuning knobs for the ordering engine.
///
/// Loaded by the embedding application from wherever it keeps its
/// configuration; all fields default so a partial document works.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Gap between position keys handed out by the assigner. Larger
    /// values mean more midpoint insertions before a column has to be
    /// reindexed. Values below 2 are clamped to 2 by the store.
    #[serde(default = "default_position_spacing")]
    pub position_spacing: i64,

    /// Capacity of the board event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_position_spacing() -> i64 {
    1024
}

fn default_event_capacity() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            position_spacing: default_position_spacing(),
            event_capacity: default_event_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert!(config.position_spacing >= 2);
        assert!(config.event_capacity > 0);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"position_spacing": 16}"#).unwrap();
        assert_eq!(config.position_spacing, 16);
        assert_eq!(config.event_capacity, default_event_capacity());
    }
}
