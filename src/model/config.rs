use serde::{Deserialize, Serialize};

/// Configuration from `config.toml` in the data directory. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub ordering: OrderingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept for undo
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    crate::ops::history::HISTORY_LIMIT
}

/// Thresholds that trigger a full renumbering of ordering keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Largest allowed `max - min` over all keys
    #[serde(default = "default_span_limit")]
    pub span_limit: i64,
    /// Largest allowed absolute key value
    #[serde(default = "default_magnitude_limit")]
    pub magnitude_limit: i64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        OrderingConfig {
            span_limit: default_span_limit(),
            magnitude_limit: default_magnitude_limit(),
        }
    }
}

fn default_span_limit() -> i64 {
    1_000_000_000
}

fn default_magnitude_limit() -> i64 {
    4_000_000_000_000_000
}
