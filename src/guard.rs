use anyhow::Result;
use serde_json::Value;

use crate::store::Store;

/// Duplicate check run before every create: User.email globally,
/// Device.name per owner, SensorReading.name per device.
///
/// Check and insert are two independent store calls, so two concurrent
/// creates of the same key can both observe "free" and both land. The store
/// offers no conditional insert keyed on a non-id field; the window stays
/// open and is documented rather than papered over.
pub async fn is_taken(store: &Store, collection: &str, filters: &[(&str, Value)]) -> Result<bool> {
    Ok(!store.query_equals(collection, filters).await?.is_empty())
}
