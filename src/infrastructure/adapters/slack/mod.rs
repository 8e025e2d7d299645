//! Slack adapter

pub mod socket;

pub use socket::SocketModeClient;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::Invocation;
use crate::domain::traits::{Bot, BotInfo, Reply};

/// Slack Web API base URL
const API_BASE: &str = "https://slack.com/api";

/// Every reply is shown only to the invoking user
const RESPONSE_TYPE: &str = "ephemeral";

/// Envelope shared by every Web API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    error: Option<String>,
    #[serde(flatten)]
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, BotError> {
        if !self.ok {
            let error = self.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(match error.as_str() {
                "invalid_auth" | "not_authed" | "token_revoked" | "account_inactive" => {
                    BotError::Auth(format!("{}: {}", method, error))
                }
                "user_not_found" => BotError::NotFound(format!("{}: {}", method, error)),
                _ => BotError::Api(format!("{}: {}", method, error)),
            });
        }
        self.data
            .ok_or_else(|| BotError::Parse(format!("{}: empty response", method)))
    }
}

/// `auth.test` result
#[derive(Debug, Deserialize)]
struct AuthTest {
    user_id: String,
    user: String,
    team: Option<String>,
}

/// `users.info` result, reduced to the profile email
#[derive(Debug, Deserialize)]
struct UsersInfo {
    user: SlackUser,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    #[serde(default)]
    profile: Profile,
}

#[derive(Debug, Default, Deserialize)]
struct Profile {
    email: Option<String>,
}

impl UsersInfo {
    fn email(self) -> Option<String> {
        self.user.profile.email.filter(|e| !e.trim().is_empty())
    }
}

/// First few characters of a token, safe to log
fn token_hint(token: &str) -> String {
    token.chars().take(8).collect()
}

/// Body posted to an invocation's `response_url`
#[derive(Debug, Serialize)]
struct ResponseMessage<'a> {
    response_type: &'a str,
    text: &'a str,
    replace_original: bool,
}

/// Slack bot adapter
pub struct SlackAdapter {
    bot_token: String,
    app_token: String,
    client: Client,
}

impl SlackAdapter {
    pub fn new(bot_token: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            app_token: app_token.into(),
            client: Client::new(),
        }
    }

    /// Get the API URL for a method
    fn api_url(method: &str) -> String {
        format!("{}/{}", API_BASE, method)
    }

    /// Ask Slack for a fresh Socket Mode WebSocket URL
    pub async fn open_connection(&self) -> Result<String, BotError> {
        #[derive(Deserialize)]
        struct ConnectionsOpen {
            url: String,
        }

        let response = self.client
            .post(Self::api_url("apps.connections.open"))
            .bearer_auth(&self.app_token)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Slack API error: {}", response.status())));
        }

        let data: ApiResponse<ConnectionsOpen> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.into_result("apps.connections.open")?.url)
    }
}

#[async_trait]
impl Bot for SlackAdapter {
    /// Check the bot token with `auth.test`
    async fn start(&self) -> Result<BotInfo, BotError> {
        tracing::info!("Starting Slack bot (token: {}...)", token_hint(&self.bot_token));

        let response = self.client
            .post(Self::api_url("auth.test"))
            .bearer_auth(&self.bot_token)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: ApiResponse<AuthTest> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        let auth = data.into_result("auth.test")?;

        Ok(BotInfo {
            id: auth.user_id,
            name: auth.user,
            team: auth.team,
        })
    }

    async fn respond(&self, invocation: &Invocation, reply: &Reply) -> Result<(), BotError> {
        let url = invocation
            .response_url
            .as_deref()
            .ok_or_else(|| BotError::NotFound(format!("no response_url for {}", invocation.id)))?;

        tracing::debug!("Replying to {}: {}", invocation.user.id, reply.text);

        let body = ResponseMessage {
            response_type: RESPONSE_TYPE,
            text: &reply.text,
            replace_original: reply.replace_original,
        };

        let response = self.client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(BotError::Api(format!("response_url returned {}: {}", status, error)));
        }

        Ok(())
    }

    async fn user_email(&self, user_id: &str) -> Result<Option<String>, BotError> {
        let response = self.client
            .get(Self::api_url("users.info"))
            .bearer_auth(&self.bot_token)
            .query(&[("user", user_id)])
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: ApiResponse<UsersInfo> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.into_result("users.info")?.email())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_mapping() {
        let resp: ApiResponse<serde_json::Value> =
            serde_json::from_value(json!({ "ok": false, "error": "invalid_auth" })).unwrap();
        assert!(matches!(resp.into_result("auth.test"), Err(BotError::Auth(_))));

        let resp: ApiResponse<serde_json::Value> =
            serde_json::from_value(json!({ "ok": false, "error": "ratelimited" })).unwrap();
        match resp.into_result("users.info") {
            Err(BotError::Api(msg)) => assert_eq!(msg, "users.info: ratelimited"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_users_info_email() {
        let resp: ApiResponse<UsersInfo> = serde_json::from_value(json!({
            "ok": true,
            "user": { "id": "U123", "profile": { "email": "alice@example.com", "real_name": "Alice" } }
        }))
        .unwrap();
        let info = resp.into_result("users.info").unwrap();
        assert_eq!(info.email().as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_users_info_without_email() {
        // bots and users without the users:read.email scope have no email
        let resp: ApiResponse<UsersInfo> = serde_json::from_value(json!({
            "ok": true,
            "user": { "id": "U123", "is_bot": true }
        }))
        .unwrap();
        assert_eq!(resp.into_result("users.info").unwrap().email(), None);

        let resp: ApiResponse<UsersInfo> = serde_json::from_value(json!({
            "ok": true,
            "user": { "id": "U124", "profile": { "email": "" } }
        }))
        .unwrap();
        assert_eq!(resp.into_result("users.info").unwrap().email(), None);

        let resp: ApiResponse<UsersInfo> =
            serde_json::from_value(json!({ "ok": false, "error": "user_not_found" })).unwrap();
        assert!(matches!(resp.into_result("users.info"), Err(BotError::NotFound(_))));
    }

    #[test]
    fn test_auth_test_identity() {
        let resp: ApiResponse<AuthTest> = serde_json::from_value(json!({
            "ok": true,
            "url": "https://hackclub.slack.com/",
            "team": "Hack Club",
            "user": "referral-bot",
            "team_id": "T1",
            "user_id": "U0BOT"
        }))
        .unwrap();
        let auth = resp.into_result("auth.test").unwrap();
        assert_eq!(auth.user_id, "U0BOT");
        assert_eq!(auth.user, "referral-bot");
        assert_eq!(auth.team.as_deref(), Some("Hack Club"));
    }

    #[test]
    fn test_token_hint() {
        assert_eq!(token_hint("xoxb-1234-5678"), "xoxb-123");
        assert_eq!(token_hint("xoxb"), "xoxb");
        assert_eq!(token_hint("tökén-ünïcödé"), "tökén-ün");
    }

    #[test]
    fn test_response_message_body() {
        let reply = Reply::ephemeral("hi").replacing();
        let body = ResponseMessage {
            response_type: RESPONSE_TYPE,
            text: &reply.text,
            replace_original: reply.replace_original,
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "response_type": "ephemeral", "text": "hi", "replace_original": true })
        );
    }

    #[tokio::test]
    async fn test_respond_without_response_url() {
        let adapter = SlackAdapter::new("xoxb-test", "xapp-test");
        let invocation = Invocation::new("/referclub", crate::domain::entities::User::new("U1"));
        let err = adapter.respond(&invocation, &Reply::ephemeral("x")).await.unwrap_err();
        assert!(matches!(err, BotError::NotFound(_)));
    }
}
