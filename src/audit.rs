use serde_json::Value;
use tracing::warn;

use crate::bookkeeper::{Bookkeeper, Job};
use crate::model::LogEntry;
use crate::store::LOGS;

/// Append one immutable audit entry for a sensor value mutation. Renames and
/// description edits never come through here.
///
/// Fire-and-forget: the handler has already answered (or is about to) by the
/// time the append runs, and an append that still fails after the worker's
/// retries is invisible to the client.
pub async fn record_value(bookkeeper: &Bookkeeper, id_data: &str, value: &Value, timestamp: &str) {
    let entry = LogEntry {
        id_data: id_data.to_string(),
        value: value.clone(),
        timestamp: timestamp.to_string(),
    };
    match serde_json::to_value(&entry) {
        Ok(doc) => {
            bookkeeper
                .enqueue(Job::Append {
                    collection: LOGS,
                    doc,
                })
                .await;
        }
        Err(err) => warn!("audit entry for {id_data} not recorded: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn records_a_well_formed_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path().to_str().unwrap()).unwrap());
        let bk = Bookkeeper::new(store.clone(), 8);

        record_value(&bk, "sensor-1", &json!(21.5), "2024-02-03 04:05:06").await;

        for _ in 0..100 {
            let entries = store
                .query_equals(LOGS, &[("id_data", json!("sensor-1"))])
                .await
                .unwrap();
            if let Some((_, doc)) = entries.into_iter().next() {
                let entry: LogEntry = serde_json::from_value(doc).unwrap();
                assert_eq!(entry.value, json!(21.5));
                assert_eq!(entry.timestamp, "2024-02-03 04:05:06");
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("log entry never appeared");
    }
}
