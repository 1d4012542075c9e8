//! Data Transfer Objects for the HTTP API.
//!
//! Query parameter names keep the camel-case spelling clients already send.

use serde::{Deserialize, Serialize};

pub use crate::models::{DataDictionaryEntry, EquipmentDictionaryEntry, MeasurementRecord};
pub use crate::services::RangeParams;

/// `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Range read result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<MeasurementRecord>,
}

/// Dictionary read result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResponse<T> {
    pub message: String,
    pub data: Vec<T>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Time-series store state: `connected`, `disconnected` or `error: ...`
    pub time_series: String,
    /// Document store state
    pub documents: String,
}

/// Query parameters for `GET /dataDictionary/read`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataDictionaryQuery {
    #[serde(rename = "equipmentUUID")]
    pub equipment_uuid: Option<String>,
    #[serde(rename = "dataItemID")]
    pub data_item_id: Option<String>,
}

/// Query parameters for `GET /equipmentDictionary/read`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentDictionaryQuery {
    #[serde(rename = "equipmentUUID")]
    pub equipment_uuid: Option<String>,
    #[serde(rename = "equipmentName")]
    pub equipment_name: Option<String>,
    #[serde(rename = "equipmentId")]
    pub equipment_id: Option<String>,
}
