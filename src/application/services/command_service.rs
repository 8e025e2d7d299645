use std::sync::Arc;

use crate::application::errors::ReferralError;
use crate::application::messaging::replies;
use crate::domain::entities::{CommandKind, CommandRegistry, Invocation};
use crate::domain::traits::{Bot, Reply};
use super::ReferralService;

/// Runs slash-command handlers.
///
/// Every handler step returns a [`ReferralError`]; [`CommandService::handle`]
/// is the one place that turns a failure into the generic reply.
pub struct CommandService {
    registry: CommandRegistry,
    referrals: ReferralService,
    bot: Arc<dyn Bot>,
    apply_url: String,
}

impl CommandService {
    pub fn new(referrals: ReferralService, bot: Arc<dyn Bot>, apply_url: impl Into<String>) -> Self {
        Self {
            registry: CommandRegistry::referral_commands(),
            referrals,
            bot,
            apply_url: apply_url.into(),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Handle one invocation. Errors are logged and reported to the user, never returned.
    pub async fn handle(&self, invocation: &Invocation) {
        let Some(command) = self.registry.find(&invocation.command) else {
            tracing::warn!("Unknown command {} from {}", invocation.command, invocation.user);
            let text = replies::unknown_command(&invocation.command, &self.registry);
            if let Err(e) = self.bot.respond(invocation, &Reply::ephemeral(text)).await {
                tracing::error!("Failed to send reply: {}", e);
            }
            return;
        };

        tracing::info!("Handling /{} for {}", command.name, invocation.user);
        if !invocation.text.is_empty() {
            tracing::debug!("Ignoring arguments to /{}: {:?}", command.name, invocation.text);
        }

        let result = match command.kind {
            CommandKind::ReferClub => self.refer_club(invocation).await,
            CommandKind::ReferralStats => self.referral_stats(invocation).await,
        };

        if let Err(e) = result {
            self.report_failure(invocation, &e).await;
        }
    }

    /// Log `error` and tell the user, in general terms, that their command failed
    pub async fn report_failure(&self, invocation: &Invocation, error: &ReferralError) {
        tracing::error!("Error responding to {} for {}: {}", invocation.command, invocation.user, error);
        let reply = Reply::ephemeral(replies::GENERIC_FAILURE).replacing();
        if let Err(e) = self.bot.respond(invocation, &reply).await {
            tracing::error!("Failed to send failure reply: {}", e);
        }
    }

    /// `/referclub`: return the caller's code, creating it on first use
    async fn refer_club(&self, invocation: &Invocation) -> Result<(), ReferralError> {
        let user = &invocation.user;
        self.bot.respond(invocation, &Reply::ephemeral(replies::LOOKING_UP)).await?;

        let text = match self.referrals.find(&user.id).await? {
            Some(record) => replies::existing_code(&record.fields.referral_code, &self.apply_url),
            None => {
                self.bot
                    .respond(invocation, &Reply::ephemeral(replies::GENERATING).replacing())
                    .await?;

                let email = self
                    .bot
                    .user_email(&user.id)
                    .await
                    .map_err(ReferralError::ProfileLookup)?;

                let record = self.referrals.issue(user, email).await?;
                replies::new_code(&record.fields.referral_code, &self.apply_url)
            }
        };

        self.bot.respond(invocation, &Reply::ephemeral(text).replacing()).await?;
        Ok(())
    }

    /// `/referralstats`: show the caller's code, count and creation date
    async fn referral_stats(&self, invocation: &Invocation) -> Result<(), ReferralError> {
        self.bot.respond(invocation, &Reply::ephemeral(replies::FETCHING_STATS)).await?;

        let text = match self.referrals.find(&invocation.user.id).await? {
            Some(record) => replies::stats(&record.fields),
            None => replies::NO_CODE_YET.to_string(),
        };

        self.bot.respond(invocation, &Reply::ephemeral(text).replacing()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::application::errors::{BotError, StorageError};
    use crate::domain::entities::{Filter, ReferralCode, ReferralFields, ReferralRecord, User};
    use crate::domain::traits::{BotInfo, Store};
    use crate::infrastructure::storage::MemoryStore;

    /// Records every reply instead of sending it
    #[derive(Default)]
    struct RecordingBot {
        replies: Mutex<Vec<Reply>>,
        email: Option<String>,
        fail_profile: bool,
    }

    impl RecordingBot {
        async fn texts(&self) -> Vec<String> {
            self.replies.lock().await.iter().map(|r| r.text.clone()).collect()
        }

        async fn last(&self) -> Reply {
            self.replies.lock().await.last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn start(&self) -> Result<BotInfo, BotError> {
            Ok(BotInfo { id: "B1".to_string(), name: "test".to_string(), team: None })
        }

        async fn respond(&self, _invocation: &Invocation, reply: &Reply) -> Result<(), BotError> {
            self.replies.lock().await.push(reply.clone());
            Ok(())
        }

        async fn user_email(&self, _user_id: &str) -> Result<Option<String>, BotError> {
            if self.fail_profile {
                return Err(BotError::Api("user_not_found".to_string()));
            }
            Ok(self.email.clone())
        }
    }

    /// Store whose reads always fail
    struct BrokenStore;

    #[async_trait]
    impl Store for BrokenStore {
        async fn read(&self, _filter: &Filter) -> Result<Vec<ReferralRecord>, StorageError> {
            Err(StorageError::Network("connection refused".to_string()))
        }

        async fn create(&self, _fields: &ReferralFields) -> Result<ReferralRecord, StorageError> {
            Err(StorageError::Network("connection refused".to_string()))
        }
    }

    fn service(store: Arc<dyn Store>, bot: Arc<RecordingBot>) -> CommandService {
        CommandService::new(ReferralService::new(store), bot, "apply.hackclub.com")
    }

    fn invocation(command: &str) -> Invocation {
        Invocation::new(command, User::new("U123").with_username("alice"))
    }

    #[tokio::test]
    async fn test_referclub_creates_one_record() {
        let store = Arc::new(MemoryStore::new());
        let bot = Arc::new(RecordingBot { email: Some("alice@example.com".to_string()), ..Default::default() });
        let svc = service(store.clone(), bot.clone());

        svc.handle(&invocation("/referclub")).await;

        let records = store.read(&Filter::equals("slackID", "U123")).await.unwrap();
        assert_eq!(records.len(), 1);
        let fields = &records[0].fields;
        assert_eq!(fields.slack_id, "U123");
        assert_eq!(fields.referral_count, 0);
        assert!(fields.is_active);
        assert_eq!(fields.email.as_deref(), Some("alice@example.com"));
        assert!(fields.referral_code.as_str().starts_with("HC_ALI_"));

        let texts = bot.texts().await;
        assert_eq!(texts[0], replies::LOOKING_UP);
        assert_eq!(texts[1], replies::GENERATING);
        let last = bot.last().await;
        assert!(last.replace_original);
        assert!(last.text.starts_with("A new referral code has been generated!"));
        assert!(last.text.contains(fields.referral_code.as_str()));
    }

    #[tokio::test]
    async fn test_referclub_returns_existing_code() {
        let store = Arc::new(MemoryStore::new());
        let existing = ReferralFields::new("U123", ReferralCode::from("HC_ALI_X1Y_Z2W".to_string()), Utc::now(), None);
        store.create(&existing).await.unwrap();

        let bot = Arc::new(RecordingBot::default());
        let svc = service(store.clone(), bot.clone());
        svc.handle(&invocation("/referclub")).await;
        svc.handle(&invocation("/referclub")).await;

        assert_eq!(store.len().await, 1);
        let last = bot.last().await;
        assert!(last.text.starts_with("Your existing referral code is: `HC_ALI_X1Y_Z2W`."));
        assert!(!bot.texts().await.iter().any(|t| t == replies::GENERATING));
    }

    #[tokio::test]
    async fn test_referclub_twice_keeps_first_code() {
        let store = Arc::new(MemoryStore::new());
        let bot = Arc::new(RecordingBot::default());
        let svc = service(store.clone(), bot.clone());

        svc.handle(&invocation("/referclub")).await;
        let code = store.read(&Filter::equals("slackID", "U123")).await.unwrap()[0]
            .fields
            .referral_code
            .clone();
        svc.handle(&invocation("/referclub")).await;

        assert_eq!(store.len().await, 1);
        assert!(bot.last().await.text.contains(code.as_str()));
    }

    #[tokio::test]
    async fn test_stats_without_record() {
        let store = Arc::new(MemoryStore::new());
        let bot = Arc::new(RecordingBot::default());
        service(store.clone(), bot.clone()).handle(&invocation("/referralstats")).await;

        assert_eq!(bot.last().await.text, replies::NO_CODE_YET);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_stats_with_record() {
        let store = Arc::new(MemoryStore::new());
        let mut fields = ReferralFields::new("U123", ReferralCode::from("HC_ALI_X1Y_Z2W".to_string()), Utc::now(), None);
        fields.referral_count = 5;
        fields.created_at = Some("2024-01-01T00:00:00Z".to_string());
        store.create(&fields).await.unwrap();

        let bot = Arc::new(RecordingBot::default());
        service(store, bot.clone()).handle(&invocation("/referralstats")).await;

        let texts = bot.texts().await;
        assert_eq!(texts[0], replies::FETCHING_STATS);
        let last = bot.last().await;
        assert!(last.replace_original);
        assert!(last.text.contains("HC_ALI_X1Y_Z2W"));
        assert!(last.text.contains("referred 5 people"));
        assert!(last.text.contains("1/1/2024"));
    }

    #[tokio::test]
    async fn test_store_failure_sends_generic_reply() {
        let bot = Arc::new(RecordingBot::default());
        let svc = service(Arc::new(BrokenStore), bot.clone());

        svc.handle(&invocation("/referclub")).await;
        assert_eq!(bot.last().await.text, replies::GENERIC_FAILURE);

        svc.handle(&invocation("/referralstats")).await;
        assert_eq!(bot.last().await.text, replies::GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_profile_failure_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let bot = Arc::new(RecordingBot { fail_profile: true, ..Default::default() });
        service(store.clone(), bot.clone()).handle(&invocation("/referclub")).await;

        assert_eq!(store.len().await, 0);
        assert_eq!(bot.last().await.text, replies::GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let bot = Arc::new(RecordingBot::default());
        service(Arc::new(MemoryStore::new()), bot.clone()).handle(&invocation("/help")).await;

        let last = bot.last().await;
        assert!(last.text.contains("/referclub"));
        assert!(!last.replace_original);
    }
}
