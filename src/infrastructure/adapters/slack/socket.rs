//! Slack Socket Mode client
//!
//! Slack pushes envelopes over a WebSocket opened from a URL returned by
//! `apps.connections.open`. Every envelope carrying an `envelope_id` must be
//! acknowledged within three seconds, so acks are written from the socket
//! task before any handler work starts.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::SlackAdapter;
use crate::application::errors::BotError;
use crate::application::messaging::{MessageDispatcher, MessageParser};

/// One Socket Mode frame
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Hello { num_connections: Option<u64> },
    SlashCommand { envelope_id: String, payload: Value },
    Disconnect { reason: String },
    /// Any other type (events_api, interactive, ...) - acked and ignored
    Other { envelope_id: Option<String>, kind: String },
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, BotError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| BotError::Parse(format!("invalid envelope: {}", e)))?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BotError::Parse("envelope without type".to_string()))?
            .to_string();
        let envelope_id = value
            .get("envelope_id")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(match kind.as_str() {
            "hello" => Envelope::Hello {
                num_connections: value.get("num_connections").and_then(Value::as_u64),
            },
            "disconnect" => Envelope::Disconnect {
                reason: value
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            },
            "slash_commands" => {
                let envelope_id = envelope_id
                    .ok_or_else(|| BotError::Parse("slash_commands without envelope_id".to_string()))?;
                let payload = value.get("payload").cloned().unwrap_or(Value::Null);
                Envelope::SlashCommand { envelope_id, payload }
            }
            _ => Envelope::Other { envelope_id, kind },
        })
    }

    pub fn envelope_id(&self) -> Option<&str> {
        match self {
            Envelope::SlashCommand { envelope_id, .. } => Some(envelope_id),
            Envelope::Other { envelope_id, .. } => envelope_id.as_deref(),
            _ => None,
        }
    }
}

/// Acknowledgement frame for an envelope
pub fn ack_frame(envelope_id: &str) -> String {
    json!({ "envelope_id": envelope_id }).to_string()
}

/// Why a connection ended
#[derive(Debug, PartialEq, Eq)]
enum Closed {
    /// Slack asked us to reconnect
    Disconnect(String),
    /// Socket closed or the stream ended
    Eof,
}

/// Keeps a Socket Mode connection open and feeds slash commands to the dispatcher
pub struct SocketModeClient {
    slack: Arc<SlackAdapter>,
    dispatcher: MessageDispatcher,
    reconnect_delay: Duration,
}

impl SocketModeClient {
    pub fn new(slack: Arc<SlackAdapter>, dispatcher: MessageDispatcher) -> Self {
        Self {
            slack,
            dispatcher,
            reconnect_delay: Duration::from_secs(5),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Run until the process is stopped. Auth failures end the loop.
    pub async fn run(&self) -> Result<(), BotError> {
        loop {
            match self.connect_once().await {
                Ok(Closed::Disconnect(reason)) => {
                    tracing::info!("Slack requested reconnect ({}), reconnecting", reason);
                    continue;
                }
                Ok(Closed::Eof) => {
                    tracing::warn!("Socket Mode connection closed");
                }
                Err(BotError::Auth(e)) => return Err(BotError::Auth(e)),
                Err(e) => {
                    tracing::error!("Socket Mode connection failed: {}", e);
                }
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn connect_once(&self) -> Result<Closed, BotError> {
        let url = self.slack.open_connection().await?;
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| BotError::Socket(e.to_string()))?;
        tracing::info!("Socket Mode connected");

        let (mut write, mut read) = ws_stream.split();

        while let Some(frame) = read.next().await {
            let frame = frame.map_err(|e| BotError::Socket(e.to_string()))?;

            let text = match frame {
                Message::Text(text) => text,
                Message::Ping(data) => {
                    write
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| BotError::Socket(e.to_string()))?;
                    continue;
                }
                Message::Close(frame) => {
                    tracing::debug!("Close frame: {:?}", frame);
                    return Ok(Closed::Eof);
                }
                _ => continue,
            };

            let envelope = match Envelope::parse(text.as_str()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!("Skipping frame: {}", e);
                    continue;
                }
            };

            if let Some(id) = envelope.envelope_id() {
                write
                    .send(Message::Text(ack_frame(id).into()))
                    .await
                    .map_err(|e| BotError::Socket(e.to_string()))?;
            }

            match envelope {
                Envelope::Hello { num_connections } => {
                    tracing::info!("Slack says hello ({:?} connections)", num_connections);
                }
                Envelope::Disconnect { reason } => return Ok(Closed::Disconnect(reason)),
                Envelope::SlashCommand { envelope_id, payload } => {
                    match MessageParser::parse(&envelope_id, payload) {
                        Ok(invocation) => {
                            self.dispatcher.dispatch(invocation);
                        }
                        Err(e) => tracing::warn!("Dropping envelope {}: {}", envelope_id, e),
                    }
                }
                Envelope::Other { kind, .. } => {
                    tracing::debug!("Ignoring {} envelope", kind);
                }
            }
        }

        Ok(Closed::Eof)
    }
}
