use std::sync::Arc;
use chrono::Utc;

use crate::application::errors::ReferralError;
use crate::domain::entities::referral::fields;
use crate::domain::entities::{Filter, ReferralCode, ReferralFields, ReferralRecord, User};
use crate::domain::traits::Store;

/// Reads and issues referral codes against a [`Store`]
#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn Store>,
}

impl ReferralService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The user's referral record, if one exists
    pub async fn find(&self, slack_id: &str) -> Result<Option<ReferralRecord>, ReferralError> {
        let filter = Filter::equals(fields::SLACK_ID, slack_id);
        let mut records = self
            .store
            .read(&filter)
            .await
            .map_err(ReferralError::StoreRead)?;

        if records.len() > 1 {
            tracing::warn!(
                "Found {} referral records for {}, using the first",
                records.len(),
                slack_id
            );
        }

        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    /// Issue a new code for `user` and persist it. Does not check for an
    /// existing record; call [`ReferralService::find`] first.
    pub async fn issue(&self, user: &User, email: Option<String>) -> Result<ReferralRecord, ReferralError> {
        let code = ReferralCode::generate(user.display_name());
        let new_fields = ReferralFields::new(&user.id, code, Utc::now(), email);

        let record = self
            .store
            .create(&new_fields)
            .await
            .map_err(ReferralError::StoreWrite)?;

        tracing::info!(
            "Issued referral code {} to {} (record {})",
            record.fields.referral_code,
            user,
            record.id
        );
        Ok(record)
    }
}
