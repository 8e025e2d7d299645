use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::{Filter, ReferralFields, ReferralRecord};

/// Store trait - the referral table.
///
/// Stores offer no uniqueness constraint; callers that need one look up
/// before they create.
#[async_trait]
pub trait Store: Send + Sync {
    /// All records matching `filter`
    async fn read(&self, filter: &Filter) -> Result<Vec<ReferralRecord>, StorageError>;

    /// Create a record and return it with its assigned id
    async fn create(&self, fields: &ReferralFields) -> Result<ReferralRecord, StorageError>;
}
