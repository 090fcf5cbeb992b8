use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::api::types::ApiEnvelope;
use crate::api::AppState;
use crate::clock;
use crate::store::LOGS;

/// Audit trail of one sensor, oldest first. Entries may reference a sensor
/// that no longer exists.
pub async fn get_all(State(state): State<AppState>, Path(id_data): Path<String>) -> Response {
    match state
        .store
        .query_equals(LOGS, &[("id_data", json!(id_data))])
        .await
    {
        Ok(matches) => {
            if matches.is_empty() {
                return ApiEnvelope::not_found("no log is found", json!([])).into_response();
            }

            let mut entries = matches;
            // query order is meaningless; order by the recorded instant
            entries.sort_by_key(|(id, doc)| {
                let stamp = doc["timestamp"].as_str().unwrap_or_default();
                (clock::parse_stamp(stamp), id.clone())
            });

            let entries: Vec<_> = entries
                .into_iter()
                .map(|(id, doc)| {
                    json!({
                        "id": id,
                        "id_data": doc["id_data"],
                        "value": doc["value"],
                        "timestamp": doc["timestamp"],
                    })
                })
                .collect();
            ApiEnvelope::read_ok(json!(entries)).into_response()
        }
        Err(_) => ApiEnvelope::failure("error while fetching data", json!([])).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testutil::{body, state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn empty_trail_is_not_found() {
        let (_dir, app) = state();
        let (status, env) = body(get_all(State(app.clone()), Path("s1".into())).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(env["code"], json!(404));
        assert_eq!(env["msg"], json!("no log is found"));
    }

    #[tokio::test]
    async fn entries_come_back_oldest_first() {
        let (_dir, app) = state();
        for (value, stamp) in [
            (json!(3), "2024-02-03 10:00:00"),
            (json!(1), "2024-02-01 10:00:00"),
            (json!(2), "2024-02-02 10:00:00"),
        ] {
            app.store
                .insert(
                    LOGS,
                    &json!({"id_data": "s1", "value": value, "timestamp": stamp}),
                )
                .await
                .unwrap();
        }
        // an entry for another sensor stays out of the trail
        app.store
            .insert(
                LOGS,
                &json!({"id_data": "s2", "value": 9, "timestamp": "2024-02-01 00:00:00"}),
            )
            .await
            .unwrap();

        let (_, env) = body(get_all(State(app.clone()), Path("s1".into())).await).await;
        let values: Vec<_> = env["result"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["value"].clone())
            .collect();
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
    }
}
