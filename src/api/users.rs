use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::types::{
    bad_request, store_fail, ApiEnvelope, ChangePasswordRequest, CreateUserRequest, IdRequest,
    LoginRequest, UpdateUserRequest,
};
use crate::api::AppState;
use crate::clock;
use crate::credential;
use crate::guard;
use crate::hierarchy;
use crate::model::User;
use crate::session::{self, SessionState};
use crate::store::USERS;

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    let (Some(name), Some(email), Some(password)) = (req.name, req.email, req.password) else {
        return bad_request(ApiEnvelope::failure(
            "fail to create new user, wrong parameters",
            json!("missing field"),
        ));
    };

    match guard::is_taken(&state.store, USERS, &[("email", json!(email))]).await {
        Ok(true) => ApiEnvelope::failure(
            "email address is already used",
            json!("Cannot register with this email, another user has been found!"),
        )
        .into_response(),
        Ok(false) => {
            let user = User {
                name,
                email,
                password_digest: credential::digest(&password),
                last_update: clock::now_stamp(),
                last_login: String::new(),
            };
            let doc = match serde_json::to_value(&user) {
                Ok(doc) => doc,
                Err(err) => return store_fail("fail to create new user, wrong parameters", err),
            };
            match state.store.insert(USERS, &doc).await {
                Ok(_) => ApiEnvelope::created().into_response(),
                Err(err) => store_fail("fail to create new user, wrong parameters", err),
            }
        }
        Err(err) => store_fail("fail to create new user, wrong parameters", err),
    }
}

pub async fn get_info(State(state): State<AppState>, Path(email): Path<String>) -> Response {
    match state
        .store
        .query_equals(USERS, &[("email", json!(email))])
        .await
    {
        Ok(matches) => match matches.into_iter().next() {
            Some((id, doc)) => match serde_json::from_value::<User>(doc) {
                Ok(user) => ApiEnvelope::read_ok(json!({
                    "id": id,
                    "name": user.name,
                    "email": user.email,
                    "last_update": user.last_update,
                }))
                .into_response(),
                Err(_) => ApiEnvelope::failure("error while getting data", json!({})).into_response(),
            },
            None => ApiEnvelope::not_found("no user is found", json!({})).into_response(),
        },
        Err(_) => ApiEnvelope::failure("error while getting data", json!({})).into_response(),
    }
}

pub async fn get_id(State(state): State<AppState>, Path(email): Path<String>) -> Response {
    match state
        .store
        .query_equals(USERS, &[("email", json!(email))])
        .await
    {
        Ok(matches) => match matches.into_iter().next() {
            Some((id, _)) => ApiEnvelope::read_ok(json!({ "id": id })).into_response(),
            None => ApiEnvelope::not_found("no user is found", json!({})).into_response(),
        },
        Err(_) => ApiEnvelope::failure("error while getting data", json!([])).into_response(),
    }
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_by_id(USERS, &id).await {
        Ok(Some(doc)) => match serde_json::from_value::<User>(doc) {
            Ok(user) => ApiEnvelope::read_ok(json!({
                "id": id,
                "name": user.name,
                "email": user.email,
                "last_update": user.last_update,
            }))
            .into_response(),
            Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
        },
        Ok(None) => ApiEnvelope::not_found("no user is found", json!({})).into_response(),
        Err(_) => ApiEnvelope::failure("error while fetching data", json!({})).into_response(),
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    let (Some(id), Some(name), Some(email)) = (req.id, req.name, req.email) else {
        return bad_request(ApiEnvelope::failure(
            "fail to update user data, wrong parameters",
            json!("missing field"),
        ));
    };

    let patch = json!({"name": name, "email": email, "last_update": clock::now_stamp()});
    match state.store.update_by_id(USERS, &id, &patch).await {
        Ok(true) => ApiEnvelope::updated("user data updated").into_response(),
        Ok(false) => bad_request(ApiEnvelope::failure(
            "fail to update user data, wrong parameters",
            json!("no user with this id"),
        )),
        Err(err) => store_fail("fail to update user data, wrong parameters", err),
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Response {
    let (Some(id), Some(old_password), Some(new_password)) =
        (req.id, req.old_password, req.new_password)
    else {
        return bad_request(ApiEnvelope::failure(
            "failed",
            json!("failed to get previous data"),
        ));
    };

    let user: User = match state.store.get_by_id(USERS, &id).await {
        Ok(Some(doc)) => match serde_json::from_value(doc) {
            Ok(user) => user,
            Err(_) => {
                return bad_request(ApiEnvelope::failure(
                    "failed",
                    json!("failed to get previous data"),
                ))
            }
        },
        _ => {
            return bad_request(ApiEnvelope::failure(
                "failed",
                json!("failed to get previous data"),
            ))
        }
    };

    if user.password_digest != credential::digest(&old_password) {
        return bad_request(ApiEnvelope::failure(
            "old password not match",
            json!("please try again"),
        ));
    }

    let patch = json!({
        "password": credential::digest(&new_password),
        "last_update": clock::now_stamp(),
    });
    match state.store.update_by_id(USERS, &id, &patch).await {
        Ok(true) => ApiEnvelope::updated("user data updated").into_response(),
        Ok(false) => bad_request(ApiEnvelope::failure(
            "fail to update user data, wrong parameters",
            json!("no user with this id"),
        )),
        Err(err) => store_fail("fail to update user data, wrong parameters", err),
    }
}

/// Row-only delete: the user's devices and readings are deliberately left
/// orphaned.
pub async fn delete_user(State(state): State<AppState>, Json(req): Json<IdRequest>) -> Response {
    let Some(id) = req.id else {
        return bad_request(ApiEnvelope::failure("failed", json!("missing field")));
    };

    match state.store.delete_by_id(USERS, &id).await {
        Ok(()) => ApiEnvelope::read_ok(json!("user has been deleted")).into_response(),
        Err(err) => store_fail("failed", err),
    }
}

pub async fn delete_user_with_data(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Response {
    let Some(id) = req.id else {
        return bad_request(ApiEnvelope::failure("failed", json!("missing field")));
    };

    match hierarchy::delete_user_with_data(&state.store, &state.bookkeeper, &id).await {
        Ok(()) => ApiEnvelope::read_ok(json!("user has been deleted")).into_response(),
        Err(err) => store_fail("failed", err),
    }
}

// ------------------------------------------------------------
// SESSION
// ------------------------------------------------------------

pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return ApiEnvelope::failure("failed", json!("Wrong parameters")).into_response();
    };

    // credentials resolve through one equality query on the stored digest
    let digest = credential::digest(&password);
    match state
        .store
        .query_equals(USERS, &[("email", json!(email)), ("password", json!(digest))])
        .await
    {
        Ok(matches) => match matches.into_iter().next() {
            Some((id, _)) => {
                let patch = json!({"last_login": clock::now_stamp()});
                match state.store.update_by_id(USERS, &id, &patch).await {
                    Ok(_) => ApiEnvelope::read_ok(json!("ok")).into_response(),
                    Err(_) => {
                        ApiEnvelope::failure("failed", json!("Wrong parameters")).into_response()
                    }
                }
            }
            None => ApiEnvelope::failure("failed", json!("Incorrect email address or password"))
                .into_response(),
        },
        Err(_) => ApiEnvelope::failure("failed", json!("Wrong parameters")).into_response(),
    }
}

pub async fn logout(State(state): State<AppState>, Json(req): Json<IdRequest>) -> Response {
    let Some(id) = req.id else {
        return ApiEnvelope::failure("failed", json!("Wrong parameters")).into_response();
    };

    let user: User = match state.store.get_by_id(USERS, &id).await {
        Ok(Some(doc)) => match serde_json::from_value(doc) {
            Ok(user) => user,
            Err(_) => {
                return ApiEnvelope::failure("error while getting data", json!({})).into_response()
            }
        },
        Ok(None) => return ApiEnvelope::not_found("no user is found", json!({})).into_response(),
        Err(_) => {
            return ApiEnvelope::failure("error while getting data", json!({})).into_response()
        }
    };

    if user.is_logged_out() {
        return ApiEnvelope::failure("failed", json!("user hasn't logged in")).into_response();
    }

    match state
        .store
        .update_by_id(USERS, &id, &json!({"last_login": ""}))
        .await
    {
        Ok(_) => ApiEnvelope::read_ok(json!("user has been logged out")).into_response(),
        Err(_) => ApiEnvelope::failure("error while getting data", json!({})).into_response(),
    }
}

pub async fn check_session_login(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Response {
    let Some(id) = req.id else {
        return ApiEnvelope::failure("failed", json!("Wrong parameters")).into_response();
    };

    let user: User = match state.store.get_by_id(USERS, &id).await {
        Ok(Some(doc)) => match serde_json::from_value(doc) {
            Ok(user) => user,
            Err(_) => {
                return ApiEnvelope::failure("error while getting data", json!({})).into_response()
            }
        },
        Ok(None) => return ApiEnvelope::not_found("no user is found", json!({})).into_response(),
        Err(_) => {
            return ApiEnvelope::failure("error while getting data", json!({})).into_response()
        }
    };

    let now = clock::now_stamp();
    match session::classify(&user.last_login, &now) {
        SessionState::LoggedOut => {
            ApiEnvelope::failure("failed", json!("user hasn't logged in")).into_response()
        }
        // past the window: report inactive, leave last_login for logout to clear
        SessionState::Expired => {
            ApiEnvelope::failure("failed", json!("session is not active")).into_response()
        }
        SessionState::Fresh => {
            // a successful check is itself a liveness signal: slide the window
            match state
                .store
                .update_by_id(USERS, &id, &json!({"last_login": now}))
                .await
            {
                Ok(_) => ApiEnvelope::read_ok(json!("session is active")).into_response(),
                Err(_) => {
                    ApiEnvelope::failure("error while getting data", json!({})).into_response()
                }
            }
        }
    }
}

/// Heartbeat: stamps `last_login` unconditionally, no expiry check.
pub async fn update_session_login(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Response {
    let Some(id) = req.id else {
        return bad_request(ApiEnvelope::failure(
            "fail to update user data, wrong parameters",
            json!("missing field"),
        ));
    };

    match state
        .store
        .update_by_id(USERS, &id, &json!({"last_login": clock::now_stamp()}))
        .await
    {
        Ok(true) => ApiEnvelope::updated("user session updated").into_response(),
        Ok(false) => bad_request(ApiEnvelope::failure(
            "fail to update user data, wrong parameters",
            json!("no user with this id"),
        )),
        Err(err) => store_fail("fail to update user data, wrong parameters", err),
    }
}
