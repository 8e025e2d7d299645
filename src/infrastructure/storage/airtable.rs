//! Airtable-backed referral table

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::application::errors::StorageError;
use crate::domain::entities::{Filter, ReferralFields, ReferralRecord};
use crate::domain::traits::Store;

/// Airtable REST API base URL
const API_BASE: &str = "https://api.airtable.com/v0";

/// Field names allowed inside `{...}` in a formula
static FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_ ]+$").expect("field name pattern is valid"));

/// Airtable store
pub struct AirtableStore {
    api_key: String,
    base_id: String,
    table_name: String,
    api_base: String,
    client: Client,
}

impl AirtableStore {
    pub fn new(
        api_key: impl Into<String>,
        base_id: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_id: base_id.into(),
            table_name: table_name.into(),
            api_base: API_BASE.to_string(),
            client: Client::new(),
        }
    }

    /// Point the store at a local API host
    #[cfg(test)]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.client = Client::builder().no_proxy().build().unwrap_or_default();
        self
    }

    /// URL of the table, with base id and table name percent-encoded
    fn table_url(&self) -> Result<Url, StorageError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(&self.table_name);
        Ok(url)
    }

    /// Render a filter as an Airtable formula, e.g. `{slackID} = 'U123'`.
    ///
    /// Values are emitted as escaped string literals so a crafted value
    /// cannot change the formula.
    pub fn formula(filter: &Filter) -> Result<String, StorageError> {
        match filter {
            Filter::Equals { field, value } => {
                if !FIELD_NAME.is_match(field) {
                    return Err(StorageError::InvalidFilter(format!("bad field name {:?}", field)));
                }
                Ok(format!("{{{}}} = '{}'", field, escape_literal(value)))
            }
        }
    }

    async fn error_from(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StorageError::Api { status, body }
    }
}

/// Escape a value for use inside a single-quoted formula string
fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// One page of a list response
#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<ReferralRecord>,
    /// Present when more pages follow
    offset: Option<String>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    fields: &'a ReferralFields,
}

#[async_trait]
impl Store for AirtableStore {
    async fn read(&self, filter: &Filter) -> Result<Vec<ReferralRecord>, StorageError> {
        let formula = Self::formula(filter)?;
        let url = self.table_url()?;
        tracing::debug!("Reading {} where {}", self.table_name, formula);

        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query = vec![("filterByFormula", formula.clone())];
            if let Some(ref o) = offset {
                query.push(("offset", o.clone()));
            }

            let response = self.client
                .get(url.clone())
                .bearer_auth(&self.api_key)
                .query(&query)
                .send()
                .await
                .map_err(|e| StorageError::Network(e.to_string()))?;

            if !response.status().is_success() {
                return Err(Self::error_from(response).await);
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn create(&self, fields: &ReferralFields) -> Result<ReferralRecord, StorageError> {
        let url = self.table_url()?;

        let response = self.client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&CreateRequest { fields })
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}
