use async_trait::async_trait;
use crate::domain::entities::Invocation;
use crate::application::errors::BotError;

/// Bot trait - abstraction for the chat platform the commands arrive on
#[async_trait]
pub trait Bot: Send + Sync {
    /// Verify credentials and report who the bot is connected as
    async fn start(&self) -> Result<BotInfo, BotError>;

    /// Reply to an invocation
    async fn respond(&self, invocation: &Invocation, reply: &Reply) -> Result<(), BotError>;

    /// Email address on the user's profile, if the platform exposes one
    async fn user_email(&self, user_id: &str) -> Result<Option<String>, BotError>;
}

/// An ephemeral reply to a slash command, shown only to the invoking user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Overwrite the previous reply to the same invocation instead of posting a new one
    pub replace_original: bool,
}

impl Reply {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            replace_original: false,
        }
    }

    pub fn replacing(mut self) -> Self {
        self.replace_original = true;
        self
    }
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub team: Option<String>,
}
