//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub slack: SlackConfig,
    pub airtable: AirtableConfig,
    pub referral: ReferralConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    /// Seconds to wait before reopening a dropped Socket Mode connection
    pub reconnect_delay_secs: u64,
}

/// Slack app credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SlackConfig {
    /// Bot user OAuth token (`xoxb-...`)
    pub bot_token: Option<String>,
    pub signing_secret: Option<String>,
    /// App-level token for Socket Mode (`xapp-...`)
    pub app_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AirtableConfig {
    pub base_id: Option<String>,
    pub api_key: Option<String>,
    pub table_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReferralConfig {
    /// Site named in replies as the place to use a code
    pub apply_url: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "referral-bot".to_string(),
            reconnect_delay_secs: 5,
        }
    }
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            base_id: None,
            api_key: None,
            table_name: "Referrals".to_string(),
        }
    }
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            apply_url: "apply.hackclub.com".to_string(),
        }
    }
}

/// Slack credentials checked by [`Config::validate`]
pub struct SlackCredentials<'a> {
    pub bot_token: &'a str,
    pub app_token: &'a str,
}

/// Airtable credentials
pub struct AirtableCredentials<'a> {
    pub base_id: &'a str,
    pub api_key: &'a str,
    pub table_name: &'a str,
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Overlay environment variables on top of this config
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let set = |target: &mut Option<String>, key: &str| {
            if let Some(value) = var(key).filter(|v| !v.is_empty()) {
                *target = Some(value);
            }
        };

        set(&mut self.slack.bot_token, "SLACK_BOT_TOKEN");
        set(&mut self.slack.signing_secret, "SLACK_SIGNING_SECRET");
        set(&mut self.slack.app_token, "SLACK_APP_TOKEN");
        set(&mut self.airtable.base_id, "AIRTABLE_BASE_ID");
        set(&mut self.airtable.api_key, "AIRTABLE_API_KEY");

        if let Some(table) = var("AIRTABLE_TABLE_NAME").filter(|v| !v.is_empty()) {
            self.airtable.table_name = table;
        }
        if let Some(url) = var("REFERRAL_APPLY_URL").filter(|v| !v.is_empty()) {
            self.referral.apply_url = url;
        }

        self
    }

    /// Slack credentials needed for Socket Mode
    pub fn slack_credentials(&self) -> Result<SlackCredentials<'_>, ConfigError> {
        let bot_token = required(&self.slack.bot_token, "slack.bot-token (SLACK_BOT_TOKEN)")?;
        let app_token = required(&self.slack.app_token, "slack.app-token (SLACK_APP_TOKEN)")?;

        if !app_token.starts_with("xapp-") {
            return Err(ConfigError::InvalidValue(
                "slack.app-token must be an app-level token (xapp-...)".to_string(),
            ));
        }

        Ok(SlackCredentials { bot_token, app_token })
    }

    /// Airtable credentials, or `None` if neither is configured
    pub fn airtable_credentials(&self) -> Result<Option<AirtableCredentials<'_>>, ConfigError> {
        if self.airtable.base_id.is_none() && self.airtable.api_key.is_none() {
            return Ok(None);
        }

        Ok(Some(AirtableCredentials {
            base_id: required(&self.airtable.base_id, "airtable.base-id (AIRTABLE_BASE_ID)")?,
            api_key: required(&self.airtable.api_key, "airtable.api-key (AIRTABLE_API_KEY)")?,
            table_name: &self.airtable.table_name,
        }))
    }

    /// Check everything `run` needs is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.slack_credentials()?;
        if self.airtable_credentials()?.is_none() {
            return Err(ConfigError::MissingField("airtable.base-id (AIRTABLE_BASE_ID)".to_string()));
        }
        if self.airtable.table_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("airtable.table-name is empty".to_string()));
        }
        Ok(())
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingField(name.to_string()))
}
