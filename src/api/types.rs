use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Uniform response body: `{code, msg, success, result}`.
///
/// The application code and the HTTP status are decoupled on purpose:
/// replies normally go out as HTTP 200 with the application code in the
/// body (including the 404s and the conflict 400s), and only the
/// validation/store-error paths flagged with `bad_request` also set HTTP
/// 400. Conflicts reuse code 400 rather than getting a code of their own.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub code: u16,
    pub msg: String,
    pub success: bool,
    pub result: Value,
}

impl ApiEnvelope {
    pub fn read_ok(result: Value) -> Self {
        Self {
            code: 200,
            msg: "success".into(),
            success: true,
            result,
        }
    }

    pub fn created() -> Self {
        Self {
            code: 201,
            msg: "success".into(),
            success: true,
            result: json!("ok"),
        }
    }

    pub fn updated(result: &str) -> Self {
        Self {
            code: 204,
            msg: "success".into(),
            success: true,
            result: json!(result),
        }
    }

    pub fn not_found(msg: &str, result: Value) -> Self {
        Self {
            code: 404,
            msg: msg.into(),
            success: false,
            result,
        }
    }

    pub fn failure(msg: &str, result: Value) -> Self {
        Self {
            code: 400,
            msg: msg.into(),
            success: false,
            result,
        }
    }
}

impl IntoResponse for ApiEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Envelope carried on HTTP 400 — the validation/store-error paths.
pub fn bad_request(envelope: ApiEnvelope) -> Response {
    (StatusCode::BAD_REQUEST, Json(envelope)).into_response()
}

/// Store failure surfaced to the client: HTTP 400 with the raw error text in
/// `result`.
pub fn store_fail(msg: &str, err: impl std::fmt::Display) -> Response {
    bad_request(ApiEnvelope::failure(msg, json!(err.to_string())))
}

// ------------------------------------------------------------
// REQUEST BODIES
// ------------------------------------------------------------
// Every field is optional at the serde layer; handlers check presence by
// hand so a missing field yields the uniform "wrong parameters" envelope
// instead of a framework rejection.

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub id: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `{id}` body shared by the delete and session routes.
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: Option<String>,
    pub status: Option<bool>,
    pub description: Option<String>,
    pub id_user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeviceRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDataRequest {
    pub name: Option<String>,
    pub value: Option<Value>,
    pub id_device: Option<String>,
}

/// Value update addresses the sensor either by `id` or by
/// `(id_device, name)`; `id` wins when both are supplied.
#[derive(Debug, Deserialize)]
pub struct UpdateDataValueRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub value: Option<Value>,
    pub id_device: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDataNameRequest {
    pub id: Option<String>,
    pub name: Option<String>,
}
