//! Equipment and data-item dictionary inserts and lookups.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::validation::{validate_batch, validate_dictionary_entry};
use super::GatewayError;
use crate::db::repository::DictionaryRepository;
use crate::models::{
    DataDictionaryEntry, DataItemFilter, DictionaryRecord, EquipmentDictionaryEntry,
    EquipmentFilter,
};

const LOOKUP_FAILURE: &str = "Failed to connect to database.";

/// Gateway in front of the document store.
#[derive(Clone)]
pub struct DictionaryGateway {
    repo: Arc<dyn DictionaryRepository>,
}

fn validate_all<T: DictionaryRecord>(records: Vec<Value>) -> Result<Vec<T>, GatewayError> {
    validate_batch(records, validate_dictionary_entry::<T>).map_err(|rejection| {
        debug!(kind = T::KIND, %rejection, "dictionary batch rejected");
        GatewayError::InvalidEntry(rejection)
    })
}

/// Empty query values are treated as not supplied.
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl DictionaryGateway {
    pub fn new(repo: Arc<dyn DictionaryRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn DictionaryRepository> {
        &self.repo
    }

    /// Validate and insert data-item entries as one batch.
    ///
    /// Returns the number of entries inserted.
    pub async fn insert_data_dictionary(&self, records: Vec<Value>) -> Result<usize, GatewayError> {
        let entries: Vec<DataDictionaryEntry> = validate_all(records)?;
        if entries.is_empty() {
            return Ok(0);
        }

        self.repo.insert_data_items(&entries).await.map_err(|e| {
            warn!(error = %e, "data dictionary insert failed");
            GatewayError::store(e.message().to_string(), e)
        })?;
        Ok(entries.len())
    }

    /// Validate and insert equipment entries as one batch.
    pub async fn insert_equipment_dictionary(
        &self,
        records: Vec<Value>,
    ) -> Result<usize, GatewayError> {
        let entries: Vec<EquipmentDictionaryEntry> = validate_all(records)?;
        if entries.is_empty() {
            return Ok(0);
        }

        self.repo.insert_equipment(&entries).await.map_err(|e| {
            warn!(error = %e, "equipment dictionary insert failed");
            GatewayError::store(e.message().to_string(), e)
        })?;
        Ok(entries.len())
    }

    /// Look up data-item entries by item id, else by device, else all.
    ///
    /// An unfiltered read succeeds even when nothing is stored.
    pub async fn find_data_dictionary(
        &self,
        data_item_id: Option<String>,
        equipment_uuid: Option<String>,
    ) -> Result<Vec<DataDictionaryEntry>, GatewayError> {
        let filter = DataItemFilter::new(supplied(data_item_id), supplied(equipment_uuid));

        let entries = self.repo.find_data_items(&filter).await.map_err(|e| {
            warn!(error = %e, "data dictionary lookup failed");
            GatewayError::store(LOOKUP_FAILURE, e)
        })?;

        if entries.is_empty() {
            match filter {
                DataItemFilter::All => {}
                DataItemFilter::ById(_) => {
                    return Err(GatewayError::NotFound("Could not find dataItemID.".to_string()))
                }
                DataItemFilter::ByDevice(_) => {
                    return Err(GatewayError::NotFound(
                        "Could not find dictionary entries for specified equipmentUUID."
                            .to_string(),
                    ))
                }
            }
        }
        Ok(entries)
    }

    /// Look up equipment entries matching every supplied criterion.
    ///
    /// Supplying all three criteria is refused.
    pub async fn find_equipment_dictionary(
        &self,
        filter: EquipmentFilter,
    ) -> Result<Vec<EquipmentDictionaryEntry>, GatewayError> {
        let filter = EquipmentFilter {
            device_uuid: supplied(filter.device_uuid),
            device_name: supplied(filter.device_name),
            device_id: supplied(filter.device_id),
        };
        if filter.is_fully_specified() {
            return Err(GatewayError::InvalidQuery(
                "Invalid request (parameters wrong)".to_string(),
            ));
        }

        let entries = self.repo.find_equipment(&filter).await.map_err(|e| {
            warn!(error = %e, "equipment dictionary lookup failed");
            GatewayError::store(LOOKUP_FAILURE, e)
        })?;

        if entries.is_empty() {
            return Err(GatewayError::NotFound("Could not find equipment.".to_string()));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use serde_json::json;

    fn gateway(repo: &LocalRepository) -> DictionaryGateway {
        DictionaryGateway::new(Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn test_data_entry_round_trip_with_defaults() {
        let repo = LocalRepository::new();
        let gw = gateway(&repo);
        gw.insert_data_dictionary(vec![json!({"category": "c", "id": "i1", "deviceUUID": "u1"})])
            .await
            .unwrap();

        let found = gw.find_data_dictionary(Some("i1".into()), None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "null");
        assert_eq!(found[0].item_type, "null");
    }

    #[tokio::test]
    async fn test_invalid_entry_inserts_nothing() {
        let repo = LocalRepository::new();
        let err = gateway(&repo)
            .insert_equipment_dictionary(vec![
                json!({"deviceId": "d1", "deviceName": "n", "deviceUUID": "u1"}),
                json!({"deviceId": "d2", "deviceUUID": "u2"}),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidEntry(ref r) if r.index == 1));
        assert_eq!(repo.equipment_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_store() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert_eq!(gateway(&repo).insert_data_dictionary(vec![]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unfiltered_data_read_succeeds_when_empty() {
        let repo = LocalRepository::new();
        let gw = gateway(&repo);

        assert!(gw.find_data_dictionary(None, None).await.unwrap().is_empty());
        assert!(gw.find_data_dictionary(Some("".into()), None).await.unwrap().is_empty());
        assert!(matches!(
            gw.find_data_dictionary(None, Some("u1".into())).await,
            Err(GatewayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_equipment_read_rules() {
        let repo = LocalRepository::new();
        let gw = gateway(&repo);
        gw.insert_equipment_dictionary(vec![json!({
            "deviceId": "d1", "deviceName": "Mill", "deviceUUID": "u1"
        })])
        .await
        .unwrap();

        let all_three = EquipmentFilter {
            device_uuid: Some("u1".into()),
            device_name: Some("Mill".into()),
            device_id: Some("d1".into()),
        };
        assert!(matches!(
            gw.find_equipment_dictionary(all_three).await,
            Err(GatewayError::InvalidQuery(_))
        ));

        let by_name = EquipmentFilter {
            device_name: Some("Mill".into()),
            ..Default::default()
        };
        assert_eq!(gw.find_equipment_dictionary(by_name).await.unwrap().len(), 1);

        let wrong = EquipmentFilter {
            device_uuid: Some("u1".into()),
            device_id: Some("d9".into()),
            ..Default::default()
        };
        assert!(matches!(
            gw.find_equipment_dictionary(wrong).await,
            Err(GatewayError::NotFound(_))
        ));
    }
}
