use serde::{Deserialize, Serialize};

/// Sensor reading ("data" collection).
///
/// `value` is an opaque scalar — number, text, or boolean — carried through
/// unexamined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub name: String, // unique within id_device
    pub value: serde_json::Value,
    pub id_device: String, // back-reference → device document id
    pub last_update: String,
}
