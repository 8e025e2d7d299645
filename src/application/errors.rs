//! Application layer errors

use thiserror::Error;

/// Platform (Slack) errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Slack API error: {0}")]
    Api(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Record store errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Store API error: status {status}, body: {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Everything that can go wrong while handling one slash command.
///
/// The handlers never distinguish between these for the user; they exist so
/// the log line says which step failed.
#[derive(Error, Debug)]
pub enum ReferralError {
    #[error("failed to read referral records: {0}")]
    StoreRead(#[source] StorageError),

    #[error("failed to create referral record: {0}")]
    StoreWrite(#[source] StorageError),

    #[error("failed to look up user profile: {0}")]
    ProfileLookup(#[source] BotError),

    #[error("failed to send reply: {0}")]
    Reply(#[from] BotError),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}
