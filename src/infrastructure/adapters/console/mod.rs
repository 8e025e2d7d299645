//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::application::messaging::MessageParser;
use crate::application::services::CommandService;
use crate::domain::entities::{Invocation, User};
use crate::domain::traits::{Bot, BotInfo, Reply};

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    email: Option<String>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self { email: None }
    }

    /// Email reported for every profile lookup
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Read slash commands from stdin as `user` until EOF
    pub async fn run(&self, commands: Arc<CommandService>, user: User) -> Result<(), BotError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let names: Vec<String> = commands.registry().all().map(|c| format!("/{}", c.name)).collect();
        println!("Type {} (Ctrl-D to quit)", names.join(" or "));

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?
        {
            match MessageParser::parse_line(&line, user.clone()) {
                Some(invocation) => commands.handle(&invocation).await,
                None if line.trim().is_empty() => {}
                None => println!("Commands start with '/'"),
            }
        }

        Ok(())
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<BotInfo, BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(BotInfo {
            id: "console".to_string(),
            name: "referral-bot".to_string(),
            team: None,
        })
    }

    async fn respond(&self, _invocation: &Invocation, reply: &Reply) -> Result<(), BotError> {
        if reply.replace_original {
            println!("[BOT, updated] {}", reply.text);
        } else {
            println!("[BOT] {}", reply.text);
        }
        Ok(())
    }

    async fn user_email(&self, _user_id: &str) -> Result<Option<String>, BotError> {
        Ok(self.email.clone())
    }
}
