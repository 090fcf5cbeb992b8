use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::types::{
    bad_request, store_fail, ApiEnvelope, CreateDeviceRequest, IdRequest, UpdateDeviceRequest,
};
use crate::api::AppState;
use crate::clock;
use crate::guard;
use crate::hierarchy;
use crate::model::Device;
use crate::store::{DEVICES, USERS};

pub async fn create_device(
    State(state): State<AppState>,
    Json(req): Json<CreateDeviceRequest>,
) -> Response {
    let (Some(name), Some(status), Some(description), Some(id_user)) =
        (req.name, req.status, req.description, req.id_user)
    else {
        return bad_request(ApiEnvelope::failure(
            "fail to create new device, wrong parameters",
            json!("missing field"),
        ));
    };

    // name is unique per owner, not globally
    let taken = guard::is_taken(
        &state.store,
        DEVICES,
        &[("name", json!(name)), ("id_user", json!(id_user))],
    )
    .await;
    match taken {
        Ok(true) => ApiEnvelope::failure(
            "device name is already used",
            json!("Cannot add new device with this name, choose another name!"),
        )
        .into_response(),
        Ok(false) => {
            let device = Device {
                name,
                status,
                description,
                id_user,
                last_update: clock::now_stamp(),
            };
            let doc = match serde_json::to_value(&device) {
                Ok(doc) => doc,
                Err(err) => return store_fail("fail to create new device, wrong parameters", err),
            };
            match state.store.insert(DEVICES, &doc).await {
                Ok(_) => ApiEnvelope::created().into_response(),
                Err(err) => store_fail("fail to create new device, wrong parameters", err),
            }
        }
        Err(err) => store_fail("fail to create new device, wrong parameters", err),
    }
}

/// All devices of the user owning `email`. An unknown email falls through to
/// an empty owner filter and reports "no device is found".
pub async fn get_all(State(state): State<AppState>, Path(email): Path<String>) -> Response {
    let id_user = match state
        .store
        .query_equals(USERS, &[("email", json!(email))])
        .await
    {
        Ok(matches) => matches
            .into_iter()
            .next()
            .map(|(id, _)| id)
            .unwrap_or_default(),
        Err(_) => return ApiEnvelope::not_found("no user is found", json!([])).into_response(),
    };

    match state
        .store
        .query_equals(DEVICES, &[("id_user", json!(id_user))])
        .await
    {
        Ok(matches) => {
            if matches.is_empty() {
                return ApiEnvelope::not_found("no device is found", json!([])).into_response();
            }
            let devices: Vec<_> = matches
                .into_iter()
                .map(|(id, doc)| {
                    json!({
                        "id": id,
                        "name": doc["name"],
                        "status": doc["status"],
                        "description": doc["description"],
                        "last_update": doc["last_update"],
                    })
                })
                .collect();
            ApiEnvelope::read_ok(json!(devices)).into_response()
        }
        Err(_) => ApiEnvelope::failure("error while getting data", json!([])).into_response(),
    }
}

pub async fn get_specific(State(state): State<AppState>, Path(id_device): Path<String>) -> Response {
    match state.store.get_by_id(DEVICES, &id_device).await {
        Ok(Some(doc)) => ApiEnvelope::read_ok(json!({
            "id": id_device,
            "name": doc["name"],
            "status": doc["status"],
            "description": doc["description"],
            "last_update": doc["last_update"],
        }))
        .into_response(),
        Ok(None) => ApiEnvelope::not_found("no data is found", json!({})).into_response(),
        Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
    }
}

/// Same lookup as `get_specific` but includes the owner reference.
pub async fn get_device(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_by_id(DEVICES, &id).await {
        Ok(Some(doc)) => match serde_json::from_value::<Device>(doc) {
            Ok(device) => ApiEnvelope::read_ok(json!({
                "id": id,
                "name": device.name,
                "status": device.status,
                "description": device.description,
                "id_user": device.id_user,
                "last_update": device.last_update,
            }))
            .into_response(),
            Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
        },
        Ok(None) => ApiEnvelope::not_found("no device is found", json!({})).into_response(),
        Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
    }
}

pub async fn update_device(
    State(state): State<AppState>,
    Json(req): Json<UpdateDeviceRequest>,
) -> Response {
    let (Some(id), Some(name), Some(status), Some(description)) =
        (req.id, req.name, req.status, req.description)
    else {
        return bad_request(ApiEnvelope::failure(
            "fail to update device data, wrong parameters",
            json!("missing field"),
        ));
    };

    let patch = json!({
        "name": name,
        "status": status,
        "description": description,
        "last_update": clock::now_stamp(),
    });
    match state.store.update_by_id(DEVICES, &id, &patch).await {
        Ok(true) => ApiEnvelope::updated("device data updated").into_response(),
        Ok(false) => bad_request(ApiEnvelope::failure(
            "fail to update device data, wrong parameters",
            json!("no device with this id"),
        )),
        Err(err) => store_fail("fail to update device data, wrong parameters", err),
    }
}

/// Removes the device and (behind the response) its readings; audit entries
/// stay.
pub async fn delete_device(State(state): State<AppState>, Json(req): Json<IdRequest>) -> Response {
    let Some(id) = req.id else {
        return bad_request(ApiEnvelope::failure("failed", json!("missing field")));
    };

    match hierarchy::delete_device(&state.store, &state.bookkeeper, &id).await {
        Ok(()) => ApiEnvelope::read_ok(json!("device has been deleted")).into_response(),
        Err(err) => store_fail("failed", err),
    }
}
