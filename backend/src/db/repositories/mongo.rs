//! MongoDB repository implementation for the equipment and data-item dictionaries.
//!
//! Entries are stored as plain documents using their wire field names
//! (`deviceUUID`, `type`, ...). Store-generated `_id`s are ignored on read.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use crate::db::config::MongoConfig;
use crate::db::repository::{
    DictionaryRepository, RepositoryError, RepositoryResult, StoreHealth,
};
use crate::models::{
    DataDictionaryEntry, DataItemFilter, EquipmentDictionaryEntry, EquipmentFilter,
};

/// Dictionary repository backed by a MongoDB database.
pub struct MongoRepository {
    database: Database,
    data_items: Collection<DataDictionaryEntry>,
    equipment: Collection<EquipmentDictionaryEntry>,
}

impl MongoRepository {
    /// Create a client for `config.uri`.
    ///
    /// The driver connects lazily, so an unreachable server is reported by
    /// the first operation rather than here.
    pub async fn connect(config: &MongoConfig) -> RepositoryResult<Self> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation("connect"))?;
        let database = client.database(&config.database);

        info!(database = %config.database, "MongoDB client created");

        Ok(Self {
            data_items: database.collection(&config.data_collection),
            equipment: database.collection(&config.equipment_collection),
            database,
        })
    }
}

fn data_item_query(filter: &DataItemFilter) -> Document {
    match filter {
        DataItemFilter::All => doc! {},
        DataItemFilter::ById(id) => doc! { "id": id },
        DataItemFilter::ByDevice(uuid) => doc! { "deviceUUID": uuid },
    }
}

fn equipment_query(filter: &EquipmentFilter) -> Document {
    let mut query = doc! {};
    if let Some(uuid) = &filter.device_uuid {
        query.insert("deviceUUID", uuid);
    }
    if let Some(name) = &filter.device_name {
        query.insert("deviceName", name);
    }
    if let Some(id) = &filter.device_id {
        query.insert("deviceId", id);
    }
    query
}

#[async_trait]
impl StoreHealth for MongoRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RepositoryError::from(e).with_operation("health_check"))?;
        Ok(true)
    }
}

#[async_trait]
impl DictionaryRepository for MongoRepository {
    async fn insert_data_items(&self, entries: &[DataDictionaryEntry]) -> RepositoryResult<()> {
        debug!(count = entries.len(), "inserting data dictionary entries");
        self.data_items
            .insert_many(entries)
            .await
            .map_err(|e| {
                RepositoryError::from(e)
                    .with_operation("insert_data_items")
                    .with_entity(self.data_items.name())
            })?;
        Ok(())
    }

    async fn find_data_items(
        &self,
        filter: &DataItemFilter,
    ) -> RepositoryResult<Vec<DataDictionaryEntry>> {
        let query = data_item_query(filter);
        debug!(%query, "finding data dictionary entries");

        let cursor = self.data_items.find(query).await?;
        cursor.try_collect().await.map_err(|e| {
            RepositoryError::from(e)
                .with_operation("find_data_items")
                .with_entity(self.data_items.name())
        })
    }

    async fn insert_equipment(
        &self,
        entries: &[EquipmentDictionaryEntry],
    ) -> RepositoryResult<()> {
        debug!(count = entries.len(), "inserting equipment dictionary entries");
        self.equipment
            .insert_many(entries)
            .await
            .map_err(|e| {
                RepositoryError::from(e)
                    .with_operation("insert_equipment")
                    .with_entity(self.equipment.name())
            })?;
        Ok(())
    }

    async fn find_equipment(
        &self,
        filter: &EquipmentFilter,
    ) -> RepositoryResult<Vec<EquipmentDictionaryEntry>> {
        let query = equipment_query(filter);
        debug!(%query, "finding equipment dictionary entries");

        let cursor = self.equipment.find(query).await?;
        cursor.try_collect().await.map_err(|e| {
            RepositoryError::from(e)
                .with_operation("find_equipment")
                .with_entity(self.equipment.name())
        })
    }
}
