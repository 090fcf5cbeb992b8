use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::types::{
    bad_request, store_fail, ApiEnvelope, CreateDataRequest, IdRequest, UpdateDataNameRequest,
    UpdateDataValueRequest,
};
use crate::api::AppState;
use crate::clock;
use crate::guard;
use crate::hierarchy::{self, ValueUpdate};
use crate::model::SensorReading;
use crate::store::DATA;

pub async fn create_data(
    State(state): State<AppState>,
    Json(req): Json<CreateDataRequest>,
) -> Response {
    let (Some(name), Some(value), Some(id_device)) = (req.name, req.value, req.id_device) else {
        return bad_request(ApiEnvelope::failure(
            "fail to create new data, wrong parameters",
            json!("missing field"),
        ));
    };

    let taken = guard::is_taken(
        &state.store,
        DATA,
        &[("name", json!(name)), ("id_device", json!(id_device))],
    )
    .await;
    match taken {
        Ok(true) => ApiEnvelope::failure(
            "data name is already used",
            json!("Cannot add new data with this name, choose another name!"),
        )
        .into_response(),
        Ok(false) => {
            let reading = SensorReading {
                name,
                value,
                id_device,
                last_update: clock::now_stamp(),
            };
            let doc = match serde_json::to_value(&reading) {
                Ok(doc) => doc,
                Err(err) => return store_fail("fail to create new data, wrong parameters", err),
            };
            match state.store.insert(DATA, &doc).await {
                Ok(_) => ApiEnvelope::created().into_response(),
                Err(err) => store_fail("fail to create new data, wrong parameters", err),
            }
        }
        Err(err) => store_fail("fail to create new data, wrong parameters", err),
    }
}

pub async fn get_all(State(state): State<AppState>, Path(id_device): Path<String>) -> Response {
    match state
        .store
        .query_equals(DATA, &[("id_device", json!(id_device))])
        .await
    {
        Ok(matches) => {
            if matches.is_empty() {
                return ApiEnvelope::not_found("no data is found", json!([])).into_response();
            }
            let readings: Vec<_> = matches
                .into_iter()
                .map(|(id, doc)| {
                    json!({
                        "id": id,
                        "name": doc["name"],
                        "value": doc["value"],
                        "last_update": doc["last_update"],
                    })
                })
                .collect();
            ApiEnvelope::read_ok(json!(readings)).into_response()
        }
        Err(_) => ApiEnvelope::failure("error while fetching data", json!([])).into_response(),
    }
}

/// Scoped name lookup. One match comes back as a bare object; several (the
/// guard's race can let duplicates in) come back as an array.
pub async fn get_specific(
    State(state): State<AppState>,
    Path((id_device, name)): Path<(String, String)>,
) -> Response {
    match state
        .store
        .query_equals(
            DATA,
            &[("id_device", json!(id_device)), ("name", json!(name))],
        )
        .await
    {
        Ok(matches) => {
            let mut readings: Vec<_> = matches
                .into_iter()
                .map(|(id, doc)| {
                    json!({
                        "id": id,
                        "name": doc["name"],
                        "value": doc["value"],
                        "last_update": doc["last_update"],
                    })
                })
                .collect();
            match readings.len() {
                0 => ApiEnvelope::not_found("no data is found", json!({})).into_response(),
                1 => ApiEnvelope::read_ok(readings.remove(0)).into_response(),
                _ => ApiEnvelope::read_ok(json!(readings)).into_response(),
            }
        }
        Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
    }
}

pub async fn get_data(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_by_id(DATA, &id).await {
        Ok(Some(doc)) => match serde_json::from_value::<SensorReading>(doc) {
            Ok(reading) => ApiEnvelope::read_ok(json!({
                "id": id,
                "name": reading.name,
                "value": reading.value,
                "id_device": reading.id_device,
                "last_update": reading.last_update,
            }))
            .into_response(),
            Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
        },
        Ok(None) => ApiEnvelope::not_found("no data is found", json!({})).into_response(),
        Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
    }
}

/// Value mutation — the one write that fans out: sensor value + stamp, owner
/// device stamp, one audit entry.
pub async fn update_value(
    State(state): State<AppState>,
    Json(req): Json<UpdateDataValueRequest>,
) -> Response {
    let Some(value) = req.value else {
        return bad_request(ApiEnvelope::failure(
            "fail to update data, wrong parameters",
            json!("missing field"),
        ));
    };

    if let Some(id) = req.id {
        return match hierarchy::update_value_by_id(&state.store, &state.bookkeeper, &id, &value)
            .await
        {
            Ok(ValueUpdate::Applied) => ApiEnvelope::updated("data value updated").into_response(),
            Ok(ValueUpdate::MissingSensor) => bad_request(ApiEnvelope::failure(
                "fail to update data, wrong parameters",
                json!("no data with this id"),
            )),
            Err(err) => store_fail("fail to update data, wrong parameters", err),
        };
    }

    let (Some(id_device), Some(name)) = (req.id_device, req.name) else {
        return bad_request(ApiEnvelope::failure(
            "fail to update data, wrong parameters",
            json!("missing field"),
        ));
    };

    match hierarchy::update_value_by_name(&state.store, &state.bookkeeper, &id_device, &name, &value)
        .await
    {
        // zero matches land here too: success with nothing written
        Ok(()) => ApiEnvelope::updated("data value updated").into_response(),
        Err(err) => store_fail("fail to update data, wrong parameters", err),
    }
}

/// Rename only — deliberately no audit entry and no device touch.
pub async fn update_name(
    State(state): State<AppState>,
    Json(req): Json<UpdateDataNameRequest>,
) -> Response {
    let (Some(id), Some(name)) = (req.id, req.name) else {
        return bad_request(ApiEnvelope::failure(
            "fail to update data name, wrong parameters",
            json!("missing field"),
        ));
    };

    let patch = json!({"name": name, "last_update": clock::now_stamp()});
    match state.store.update_by_id(DATA, &id, &patch).await {
        Ok(true) => ApiEnvelope::updated("data name updated").into_response(),
        Ok(false) => bad_request(ApiEnvelope::failure(
            "fail to update data name, wrong parameters",
            json!("no data with this id"),
        )),
        Err(err) => store_fail("fail to update data name, wrong parameters", err),
    }
}

/// Removes the reading; its audit trail stays behind.
pub async fn delete_data(State(state): State<AppState>, Json(req): Json<IdRequest>) -> Response {
    let Some(id) = req.id else {
        return bad_request(ApiEnvelope::failure("failed", json!("missing field")));
    };

    match state.store.delete_by_id(DATA, &id).await {
        Ok(()) => ApiEnvelope::read_ok(json!("data has been deleted")).into_response(),
        Err(err) => store_fail("failed", err),
    }
}
