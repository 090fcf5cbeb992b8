use serde::{Deserialize, Serialize};

/// Stored user document. The document id lives in the store key, not here.
///
/// `last_login` is the whole session state: empty string means logged out,
/// otherwise it holds the stamp of the last login or liveness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String, // globally unique, guarded at create
    #[serde(rename = "password")]
    pub password_digest: String,
    pub last_update: String,
    #[serde(default)]
    pub last_login: String,
}

impl User {
    pub fn is_logged_out(&self) -> bool {
        self.last_login.is_empty()
    }
}
