use anyhow::Result;
use serde_json::{json, Value};

use crate::audit;
use crate::bookkeeper::{Bookkeeper, Job};
use crate::clock;
use crate::store::{Store, DATA, DEVICES, USERS};

/// Outcome of the id-addressed value update; the name-addressed path has no
/// failure outcome by design.
#[derive(Debug, PartialEq, Eq)]
pub enum ValueUpdate {
    Applied,
    MissingSensor,
}

/// Update a sensor reading's value by document id.
///
/// The value write is awaited and its result drives the response. The
/// owning device's `last_update` and the audit entry are bookkeeping: they
/// carry the same stamp as the primary write but ride behind the response.
pub async fn update_value_by_id(
    store: &Store,
    bookkeeper: &Bookkeeper,
    id: &str,
    value: &Value,
) -> Result<ValueUpdate> {
    let stamp = clock::now_stamp();

    let touched = store
        .update_by_id(DATA, id, &json!({"value": value, "last_update": stamp}))
        .await?;
    if !touched {
        return Ok(ValueUpdate::MissingSensor);
    }

    if let Some(doc) = store.get_by_id(DATA, id).await? {
        if let Some(id_device) = doc.get("id_device").and_then(Value::as_str) {
            bookkeeper
                .enqueue(Job::Patch {
                    collection: DEVICES,
                    id: id_device.to_string(),
                    patch: json!({"last_update": stamp}),
                })
                .await;
        }
    }
    audit::record_value(bookkeeper, id, value, &stamp).await;

    Ok(ValueUpdate::Applied)
}

/// Update a sensor reading's value by (device, name).
///
/// The scoped query is expected to return at most one match. Zero matches
/// report success upstream while writing nothing — longstanding behavior
/// that callers depend on, kept as-is. On a match, all three effects (value
/// write, device touch, audit append) are dispatched to the worker and the
/// response does not wait on any of them.
pub async fn update_value_by_name(
    store: &Store,
    bookkeeper: &Bookkeeper,
    id_device: &str,
    name: &str,
    value: &Value,
) -> Result<()> {
    let matches = store
        .query_equals(
            DATA,
            &[("id_device", json!(id_device)), ("name", json!(name))],
        )
        .await?;
    let Some((id_data, _)) = matches.into_iter().next() else {
        return Ok(());
    };

    let stamp = clock::now_stamp();
    bookkeeper
        .enqueue(Job::Patch {
            collection: DATA,
            id: id_data.clone(),
            patch: json!({"value": value, "last_update": stamp}),
        })
        .await;
    bookkeeper
        .enqueue(Job::Patch {
            collection: DEVICES,
            id: id_device.to_string(),
            patch: json!({"last_update": stamp}),
        })
        .await;
    audit::record_value(bookkeeper, &id_data, value, &stamp).await;

    Ok(())
}

/// Delete a device and, independently, every reading it owns. Audit entries
/// for those readings are retained and left dangling.
pub async fn delete_device(store: &Store, bookkeeper: &Bookkeeper, id: &str) -> Result<()> {
    store.delete_by_id(DEVICES, id).await?;
    bookkeeper
        .enqueue(Job::DeleteMatching {
            collection: DATA,
            field: "id_device",
            value: id.to_string(),
        })
        .await;
    Ok(())
}

/// Full-form user delete: fan out one subtree job per owned device, then
/// remove the user row. The response follows the user delete; subtree jobs
/// may still be in flight, so a crash can leave orphaned devices — accepted
/// partial-failure window.
pub async fn delete_user_with_data(store: &Store, bookkeeper: &Bookkeeper, id: &str) -> Result<()> {
    let devices = store.query_equals(DEVICES, &[("id_user", json!(id))]).await?;
    for (id_device, _) in devices {
        bookkeeper
            .enqueue(Job::DeleteDeviceSubtree { id_device })
            .await;
    }
    store.delete_by_id(USERS, id).await?;
    Ok(())
}
