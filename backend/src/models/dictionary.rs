//! Dictionary entries kept in the document store.
//!
//! Two kinds exist: data-item entries (one per data item an agent reports)
//! and equipment entries (one per device). Both are keyed by logical
//! identifiers supplied by the client, never by store-generated keys.

use serde::{Deserialize, Serialize};

/// Value stored for optional fields that were absent or explicitly null.
pub const NULL_SENTINEL: &str = "null";

fn null_sentinel() -> String {
    NULL_SENTINEL.to_string()
}

/// Field-set description shared by the dictionary kinds.
///
/// Validation checks `REQUIRED_FIELDS` for presence, normalizes
/// `OPTIONAL_FIELDS`, then builds the typed entry with [`from_fields`].
///
/// [`from_fields`]: DictionaryRecord::from_fields
pub trait DictionaryRecord: Sized {
    /// Human-readable kind, used in log lines and error messages.
    const KIND: &'static str;
    const REQUIRED_FIELDS: &'static [&'static str];
    const OPTIONAL_FIELDS: &'static [&'static str];

    /// Build the entry from already-extracted string values.
    ///
    /// `required` is in `REQUIRED_FIELDS` order and `optional` in
    /// `OPTIONAL_FIELDS` order.
    fn from_fields(required: Vec<String>, optional: Vec<String>) -> Self;
}

/// A data-item dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDictionaryEntry {
    pub category: String,
    pub id: String,
    #[serde(rename = "deviceUUID")]
    pub device_uuid: String,
    #[serde(default = "null_sentinel")]
    pub name: String,
    #[serde(rename = "type", default = "null_sentinel")]
    pub item_type: String,
}

impl DictionaryRecord for DataDictionaryEntry {
    const KIND: &'static str = "data dictionary";
    const REQUIRED_FIELDS: &'static [&'static str] = &["category", "id", "deviceUUID"];
    const OPTIONAL_FIELDS: &'static [&'static str] = &["name", "type"];

    fn from_fields(required: Vec<String>, optional: Vec<String>) -> Self {
        let mut required = required.into_iter();
        let mut optional = optional.into_iter();
        Self {
            category: required.next().unwrap_or_else(null_sentinel),
            id: required.next().unwrap_or_else(null_sentinel),
            device_uuid: required.next().unwrap_or_else(null_sentinel),
            name: optional.next().unwrap_or_else(null_sentinel),
            item_type: optional.next().unwrap_or_else(null_sentinel),
        }
    }
}

/// An equipment dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentDictionaryEntry {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "deviceName")]
    pub device_name: String,
    #[serde(rename = "deviceUUID")]
    pub device_uuid: String,
    #[serde(default = "null_sentinel")]
    pub manufacturer: String,
    #[serde(default = "null_sentinel")]
    pub model: String,
    #[serde(default = "null_sentinel")]
    pub description: String,
}

impl DictionaryRecord for EquipmentDictionaryEntry {
    const KIND: &'static str = "equipment dictionary";
    const REQUIRED_FIELDS: &'static [&'static str] = &["deviceId", "deviceName", "deviceUUID"];
    const OPTIONAL_FIELDS: &'static [&'static str] = &["manufacturer", "model", "description"];

    fn from_fields(required: Vec<String>, optional: Vec<String>) -> Self {
        let mut required = required.into_iter();
        let mut optional = optional.into_iter();
        Self {
            device_id: required.next().unwrap_or_else(null_sentinel),
            device_name: required.next().unwrap_or_else(null_sentinel),
            device_uuid: required.next().unwrap_or_else(null_sentinel),
            manufacturer: optional.next().unwrap_or_else(null_sentinel),
            model: optional.next().unwrap_or_else(null_sentinel),
            description: optional.next().unwrap_or_else(null_sentinel),
        }
    }
}

/// Which data-item entries a read should return.
///
/// The item identifier wins when both identifiers are supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DataItemFilter {
    #[default]
    All,
    ById(String),
    ByDevice(String),
}

impl DataItemFilter {
    pub fn new(data_item_id: Option<String>, equipment_uuid: Option<String>) -> Self {
        match (data_item_id, equipment_uuid) {
            (Some(id), _) => Self::ById(id),
            (None, Some(uuid)) => Self::ByDevice(uuid),
            (None, None) => Self::All,
        }
    }

    pub fn matches(&self, entry: &DataDictionaryEntry) -> bool {
        match self {
            Self::All => true,
            Self::ById(id) => entry.id == *id,
            Self::ByDevice(uuid) => entry.device_uuid == *uuid,
        }
    }
}

/// Conjunctive equipment filter; unset members match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentFilter {
    pub device_uuid: Option<String>,
    pub device_name: Option<String>,
    pub device_id: Option<String>,
}

impl EquipmentFilter {
    /// True when every criterion is set, which reads reject.
    pub fn is_fully_specified(&self) -> bool {
        self.device_uuid.is_some() && self.device_name.is_some() && self.device_id.is_some()
    }

    pub fn matches(&self, entry: &EquipmentDictionaryEntry) -> bool {
        let check = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().map_or(true, |w| w == actual)
        };
        check(&self.device_uuid, &entry.device_uuid)
            && check(&self.device_name, &entry.device_name)
            && check(&self.device_id, &entry.device_id)
    }
}
