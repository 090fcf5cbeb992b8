use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::bookkeeper::Bookkeeper;
use crate::store::Store;

pub mod data;
pub mod devices;
pub mod logs;
pub mod types;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub bookkeeper: Bookkeeper,
}

/// Versioned API surface. Route names and grouping are kept exactly as the
/// clients already speak them.
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        // ------------------------------------------------------------
        // USER
        // ------------------------------------------------------------
        .route("/User/Create", post(users::create_user))
        .route("/User/GetInfo/{email}", get(users::get_info))
        .route("/User/GetId/{email}", get(users::get_id))
        .route("/User/GetUser/{id}", get(users::get_user))
        .route("/User/UpdateValue", post(users::update_user))
        .route("/User/ChangePassword", post(users::change_password))
        .route("/User/Delete", post(users::delete_user))
        .route("/User/DeleteWithData", post(users::delete_user_with_data))
        .route("/User/Login", post(users::login))
        .route("/User/Logout", post(users::logout))
        .route("/User/CheckSessionLogin", post(users::check_session_login))
        .route("/User/UpdateSessionLogin", post(users::update_session_login))
        // ------------------------------------------------------------
        // DEVICE
        // ------------------------------------------------------------
        .route("/Device/Create", post(devices::create_device))
        .route("/Device/GetAll/{email}", get(devices::get_all))
        .route("/Device/GetSpecific/{id_device}", get(devices::get_specific))
        .route("/Device/GetDevice/{id}", get(devices::get_device))
        .route("/Device/UpdateValue", post(devices::update_device))
        .route("/Device/Delete", post(devices::delete_device))
        // ------------------------------------------------------------
        // DATA
        // ------------------------------------------------------------
        .route("/Data/Create", post(data::create_data))
        .route("/Data/GetAll/{id_device}", get(data::get_all))
        .route(
            "/Data/GetSpecific/{id_device}/UseName/{name}",
            get(data::get_specific),
        )
        .route("/Data/GetData/{id}", get(data::get_data))
        .route("/Data/UpdateValue", post(data::update_value))
        .route("/Data/UpdateName", post(data::update_name))
        .route("/Data/Delete", post(data::delete_data))
        // ------------------------------------------------------------
        // LOG
        // ------------------------------------------------------------
        .route("/Log/GetAll/{id_data}", get(logs::get_all))
}


#[cfg(test)]
mod tests {
    use super::testutil::{body, state};
    use super::*;
    use axum::extract::{Path, State};
    use axum::Json;
    use serde_json::json;
    use tokio::time::{sleep, Duration};

    use crate::store::{DATA, DEVICES, LOGS, USERS};

    /// Full cascade through the HTTP handlers: user → device → reading →
    /// log, then DeleteWithData removes everything except the audit trail.
    #[tokio::test]
    async fn delete_with_data_clears_subtree_but_keeps_logs() {
        let (_dir, app) = state();

        users::create_user(
            State(app.clone()),
            Json(types::CreateUserRequest {
                name: Some("A".into()),
                email: Some("a@x.com".into()),
                password: Some("p1".into()),
            }),
        )
        .await;
        let (id_user, _) = app
            .store
            .query_equals(USERS, &[("email", json!("a@x.com"))])
            .await
            .unwrap()
            .remove(0);

        devices::create_device(
            State(app.clone()),
            Json(types::CreateDeviceRequest {
                name: Some("kitchen".into()),
                status: Some(true),
                description: Some("".into()),
                id_user: Some(id_user.clone()),
            }),
        )
        .await;
        let (id_device, _) = app
            .store
            .query_equals(DEVICES, &[("id_user", json!(id_user))])
            .await
            .unwrap()
            .remove(0);

        data::create_data(
            State(app.clone()),
            Json(types::CreateDataRequest {
                name: Some("temp".into()),
                value: Some(json!(1)),
                id_device: Some(id_device.clone()),
            }),
        )
        .await;
        let (id_data, _) = app
            .store
            .query_equals(DATA, &[("id_device", json!(id_device))])
            .await
            .unwrap()
            .remove(0);

        // one value mutation so the audit trail has something to outlive
        data::update_value(
            State(app.clone()),
            Json(types::UpdateDataValueRequest {
                id: Some(id_data.clone()),
                name: None,
                value: Some(json!(2)),
                id_device: None,
            }),
        )
        .await;

        let (_, env) = body(
            users::delete_user_with_data(
                State(app.clone()),
                Json(types::IdRequest {
                    id: Some(id_user.clone()),
                }),
            )
            .await,
        )
        .await;
        assert_eq!(env["result"], json!("user has been deleted"));
        assert!(app.store.get_by_id(USERS, &id_user).await.unwrap().is_none());

        for _ in 0..100 {
            let devices_left = app
                .store
                .query_equals(DEVICES, &[("id_user", json!(id_user))])
                .await
                .unwrap();
            let data_left = app
                .store
                .query_equals(DATA, &[("id_device", json!(id_device))])
                .await
                .unwrap();
            let logs = app
                .store
                .query_equals(LOGS, &[("id_data", json!(id_data))])
                .await
                .unwrap();
            if devices_left.is_empty() && data_left.is_empty() && !logs.is_empty() {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("cascade never completed");
    }

    /// Row-only delete leaves the subtree orphaned on purpose.
    #[tokio::test]
    async fn plain_delete_orphans_the_subtree() {
        let (_dir, app) = state();
        let id_user = app
            .store
            .insert(USERS, &json!({"name": "A", "email": "a@x.com"}))
            .await
            .unwrap();
        let id_device = app
            .store
            .insert(DEVICES, &json!({"name": "d", "id_user": id_user}))
            .await
            .unwrap();

        users::delete_user(
            State(app.clone()),
            Json(types::IdRequest {
                id: Some(id_user.clone()),
            }),
        )
        .await;

        sleep(Duration::from_millis(100)).await;
        assert!(app.store.get_by_id(USERS, &id_user).await.unwrap().is_none());
        assert!(app
            .store
            .get_by_id(DEVICES, &id_device)
            .await
            .unwrap()
            .is_some());
    }

    /// Device delete removes the device's readings but never the audit rows.
    #[tokio::test]
    async fn device_delete_keeps_audit_rows() {
        let (_dir, app) = state();
        let id_device = app
            .store
            .insert(DEVICES, &json!({"name": "d", "id_user": "u1"}))
            .await
            .unwrap();
        let id_data = app
            .store
            .insert(DATA, &json!({"name": "temp", "id_device": id_device}))
            .await
            .unwrap();
        app.store
            .insert(
                LOGS,
                &json!({"id_data": id_data, "value": 1, "timestamp": "2024-02-01 00:00:00"}),
            )
            .await
            .unwrap();

        devices::delete_device(
            State(app.clone()),
            Json(types::IdRequest {
                id: Some(id_device.clone()),
            }),
        )
        .await;

        for _ in 0..100 {
            if app
                .store
                .get_by_id(DATA, &id_data)
                .await
                .unwrap()
                .is_none()
            {
                let (_, env) = body(
                    logs::get_all(State(app.clone()), Path(id_data.clone())).await,
                )
                .await;
                assert_eq!(env["code"], json!(200));
                assert_eq!(env["result"].as_array().unwrap().len(), 1);
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("reading never removed");
    }
}
