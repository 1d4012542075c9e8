//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! gateways in the service layer.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::Value;

use super::dto::{
    DataDictionaryEntry, DataDictionaryQuery, DataResponse, EquipmentDictionaryEntry,
    EquipmentDictionaryQuery, HealthResponse, MessageResponse, RangeParams, ReadResponse,
    VersionResponse,
};
use super::error::AppError;
use super::router::API_VERSION;
use super::state::AppState;
use crate::db::repository::{RepositoryResult, StoreHealth};
use crate::models::EquipmentFilter;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

const INSERTED: &str = "Successfully entered data into database.";
const READ_OK: &str = "Successful read.";

// =============================================================================
// Health Check
// =============================================================================

fn describe(health: RepositoryResult<bool>) -> String {
    match health {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    }
}

/// GET /health
///
/// Reports whether each store answers its health probe.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let (time_series, documents) = tokio::join!(
        state.time_series.repository().health_check(),
        state.dictionaries.repository().health_check(),
    );

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: API_VERSION.to_string(),
        time_series: describe(time_series),
        documents: describe(documents),
    }))
}

// =============================================================================
// Service info
// =============================================================================

/// GET /{version}/api/status
pub async fn status() -> Json<MessageResponse> {
    Json(MessageResponse::new("Successful connection."))
}

/// GET /{version}/api/version
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: API_VERSION.to_string(),
    })
}

// =============================================================================
// Measurements
// =============================================================================

/// POST /{version}/api/data/write
///
/// Write a batch of measurement commands.
pub async fn write_data(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> HandlerResult<MessageResponse> {
    let Json(records) = payload?;
    state.time_series.write_records(records).await?;
    Ok(Json(MessageResponse::new("Write request was successful.")))
}

/// GET /{version}/api/data/read/{measurement}
///
/// Read the rows of one measurement, optionally narrowed by tag, time range
/// and row count.
pub async fn read_data(
    State(state): State<AppState>,
    Path(measurement): Path<String>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> HandlerResult<DataResponse> {
    let Query(params) = params?;
    let data = state.time_series.read(&measurement, &params).await?;
    Ok(Json(DataResponse { data }))
}

// =============================================================================
// Dictionaries
// =============================================================================

/// POST /{version}/api/dataDictionary/write
pub async fn write_data_dictionary(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> HandlerResult<MessageResponse> {
    let Json(records) = payload?;
    state.dictionaries.insert_data_dictionary(records).await?;
    Ok(Json(MessageResponse::new(INSERTED)))
}

/// GET /{version}/api/dataDictionary/read
///
/// `dataItemID` takes precedence over `equipmentUUID`; neither returns everything.
pub async fn read_data_dictionary(
    State(state): State<AppState>,
    query: Result<Query<DataDictionaryQuery>, QueryRejection>,
) -> HandlerResult<ReadResponse<DataDictionaryEntry>> {
    let Query(query) = query?;
    let data = state
        .dictionaries
        .find_data_dictionary(query.data_item_id, query.equipment_uuid)
        .await?;
    Ok(Json(ReadResponse {
        message: READ_OK.to_string(),
        data,
    }))
}

/// POST /{version}/api/equipmentDictionary/write
pub async fn write_equipment_dictionary(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> HandlerResult<MessageResponse> {
    let Json(records) = payload?;
    state.dictionaries.insert_equipment_dictionary(records).await?;
    Ok(Json(MessageResponse::new(INSERTED)))
}

/// GET /{version}/api/equipmentDictionary/read
pub async fn read_equipment_dictionary(
    State(state): State<AppState>,
    query: Result<Query<EquipmentDictionaryQuery>, QueryRejection>,
) -> HandlerResult<ReadResponse<EquipmentDictionaryEntry>> {
    let Query(query) = query?;
    let filter = EquipmentFilter {
        device_uuid: query.equipment_uuid,
        device_name: query.equipment_name,
        device_id: query.equipment_id,
    };
    let data = state.dictionaries.find_equipment_dictionary(filter).await?;
    Ok(Json(ReadResponse {
        message: READ_OK.to_string(),
        data,
    }))
}
