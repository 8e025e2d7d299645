//! Payload parser - turns a slash-command payload into an [`Invocation`]

use serde::Deserialize;
use crate::application::errors::BotError;
use crate::domain::entities::{Invocation, User};

/// Fields of a slash-command payload that the bot reads. Slack sends more.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommandPayload {
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub response_url: Option<String>,
}

/// Parses slash-command payloads
pub struct MessageParser;

impl MessageParser {
    /// Parse a JSON payload. `id` identifies the delivery (the envelope id).
    pub fn parse(id: &str, payload: serde_json::Value) -> Result<Invocation, BotError> {
        let parsed: SlashCommandPayload = serde_json::from_value(payload)
            .map_err(|e| BotError::Parse(format!("invalid slash command payload: {}", e)))?;

        Ok(Self::from_payload(id, parsed))
    }

    pub fn from_payload(id: &str, payload: SlashCommandPayload) -> Invocation {
        let mut user = User::new(payload.user_id);
        if let Some(name) = payload.user_name {
            user = user.with_username(name);
        }
        if let Some(name) = payload.real_name {
            user = user.with_real_name(name);
        }

        let mut invocation = Invocation::new(payload.command.trim(), user)
            .with_id(id)
            .with_text(payload.text.trim());
        if let Some(url) = payload.response_url {
            invocation = invocation.with_response_url(url);
        }
        invocation
    }

    /// Parse a line typed in the console, e.g. `/referclub`
    pub fn parse_line(line: &str, user: User) -> Option<Invocation> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }

        let (command, text) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        Some(Invocation::new(command, user).with_text(text.trim()))
    }
}
