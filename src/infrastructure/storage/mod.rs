//! Record stores: Airtable for production, in-memory for console mode and tests

pub mod airtable;

pub use airtable::AirtableStore;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{Filter, ReferralFields, ReferralRecord};
use crate::domain::traits::Store;

/// In-memory store, rows kept in insertion order
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<ReferralRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, filter: &Filter) -> Result<Vec<ReferralRecord>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| filter.matches(&r.fields))
            .cloned()
            .collect())
    }

    async fn create(&self, fields: &ReferralFields) -> Result<ReferralRecord, StorageError> {
        let record = ReferralRecord {
            id: format!("rec{}", &uuid::Uuid::new_v4().simple().to_string()[..14]),
            fields: fields.clone(),
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }
}
