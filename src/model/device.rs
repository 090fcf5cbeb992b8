use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String, // unique within id_user
    pub status: bool,
    pub description: String,
    pub id_user: String, // back-reference → user document id
    pub last_update: String,
}
