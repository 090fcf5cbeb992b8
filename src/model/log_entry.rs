use serde::{Deserialize, Serialize};

/// Append-only audit record, one per sensor value mutation.
///
/// Entries are never deleted — they outlive their sensor, so `id_data` may
/// dangle and readers must not assume it resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id_data: String,
    pub value: serde_json::Value,
    pub timestamp: String,
}
