//! VK channel: Bots Long Poll for inbound messages, `messages.send` for replies.
//!
//! Talks to the VK API directly over reqwest and adapts it to the bot's
//! `Channel` trait (event stream + send).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::channels::{
    Attachment, Channel, IncomingEvent, MessageStream, OutgoingMessage, UserId, display_name,
};
use crate::error::ChannelError;

/// Default VK API endpoint.
const VK_API_BASE: &str = "https://api.vk.com/method";

/// VK API version the request/response shapes below are written against.
const VK_API_VERSION: &str = "5.199";

/// Long-poll wait in seconds.
const LONG_POLL_WAIT_SECS: u32 = 25;

/// Back-off after a failed poll before reconnecting.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

const CHANNEL_NAME: &str = "vk";

/// Long-poll server session returned by `groups.getLongPollServer`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LongPollSession {
    server: String,
    key: String,
    ts: String,
}

/// Outcome of one `a_check` request.
#[derive(Debug, PartialEq)]
enum PollOutcome {
    Updates { ts: String, updates: Vec<Value> },
    /// History is outdated; continue with the new `ts`.
    Resync { ts: String },
    /// Key expired or information lost; a new session is needed.
    Reconnect,
}

struct VkApi {
    token: SecretString,
    group_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl VkApi {
    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    /// Call an API method and unwrap its `response` field.
    async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value, ChannelError> {
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.token.expose_secret().to_string()));
        form.push(("v", VK_API_VERSION.to_string()));

        let resp = self
            .client
            .post(self.api_url(method))
            .form(&form)
            .send()
            .await
            .map_err(|e| ChannelError::Http(format!("{method}: {e}")))?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ChannelError::InvalidMessage(format!("{method}: {e}")))?;

        check_api_response(body)
    }

    async fn long_poll_session(&self) -> Result<LongPollSession, ChannelError> {
        let response = self
            .call(
                "groups.getLongPollServer",
                &[("group_id", self.group_id.clone())],
            )
            .await?;
        parse_long_poll_session(&response).ok_or_else(|| {
            ChannelError::InvalidMessage("groups.getLongPollServer: missing server/key/ts".into())
        })
    }

    async fn poll(&self, session: &LongPollSession) -> Result<PollOutcome, ChannelError> {
        let wait = LONG_POLL_WAIT_SECS.to_string();
        let body: Value = self
            .client
            .get(&session.server)
            .query(&[
                ("act", "a_check"),
                ("key", session.key.as_str()),
                ("ts", session.ts.as_str()),
                ("wait", wait.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ChannelError::Http(format!("a_check: {e}")))?
            .json()
            .await
            .map_err(|e| ChannelError::InvalidMessage(format!("a_check: {e}")))?;

        parse_poll_outcome(&body)
            .ok_or_else(|| ChannelError::InvalidMessage(format!("a_check: unexpected body {body}")))
    }

    /// Look up "First Last" for a user, falling back to the placeholder name.
    async fn user_display_name(&self, user_id: UserId) -> String {
        match self
            .call("users.get", &[("user_ids", user_id.to_string())])
            .await
        {
            Ok(response) => {
                let user = response.get(0);
                display_name(
                    user_id,
                    user.and_then(|u| u.get("first_name")).and_then(Value::as_str),
                    user.and_then(|u| u.get("last_name")).and_then(Value::as_str),
                )
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "VK users.get failed");
                display_name(user_id, None, None)
            }
        }
    }
}

/// VK community channel.
pub struct VkChannel {
    api: Arc<VkApi>,
}

impl VkChannel {
    pub fn new(token: SecretString, group_id: impl Into<String>) -> Self {
        Self {
            api: Arc::new(VkApi {
                token,
                group_id: group_id.into(),
                api_base: VK_API_BASE.to_string(),
                client: reqwest::Client::new(),
            }),
        }
    }

    /// Point the channel at a different API endpoint.
    pub fn with_api_base(token: SecretString, group_id: impl Into<String>, base: &str) -> Self {
        Self {
            api: Arc::new(VkApi {
                token,
                group_id: group_id.into(),
                api_base: base.trim_end_matches('/').to_string(),
                client: reqwest::Client::new(),
            }),
        }
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for VkChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        // Fail fast on bad credentials instead of looping forever.
        let first_session =
            self.api
                .long_poll_session()
                .await
                .map_err(|e| ChannelError::StartupFailed {
                    name: CHANNEL_NAME.into(),
                    reason: e.to_string(),
                })?;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let api = Arc::clone(&self.api);

        tokio::spawn(async move {
            let mut session = Some(first_session);
            tracing::info!("VK channel listening for messages...");

            loop {
                let current = match session.take() {
                    Some(s) => s,
                    None => match api.long_poll_session().await {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::warn!("VK long poll session error: {e}");
                            tokio::time::sleep(POLL_RETRY_DELAY).await;
                            continue;
                        }
                    },
                };

                let outcome = match api.poll(&current).await {
                    Ok(o) => o,
                    Err(e) => {
                        tracing::warn!("VK poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        session = Some(current);
                        continue;
                    }
                };

                match outcome {
                    PollOutcome::Updates { ts, updates } => {
                        for update in &updates {
                            let Some((user_id, text, attachments)) = parse_message_new(update)
                            else {
                                continue;
                            };

                            let name = api.user_display_name(user_id).await;
                            let mut event =
                                IncomingEvent::new(user_id, text).with_display_name(name);
                            event.attachments = attachments;

                            if tx.send(event).is_err() {
                                tracing::info!("VK listener channel closed");
                                return;
                            }
                        }
                        session = Some(LongPollSession { ts, ..current });
                    }
                    PollOutcome::Resync { ts } => {
                        tracing::debug!("VK long poll history outdated, resyncing");
                        session = Some(LongPollSession { ts, ..current });
                    }
                    PollOutcome::Reconnect => {
                        tracing::info!("VK long poll key expired, reconnecting");
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ChannelError> {
        let params = send_params(&message, rand::random::<i32>());
        self.api
            .call("messages.send", &params)
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: CHANNEL_NAME.into(),
                reason: e.to_string(),
            })?;
        tracing::debug!(user_id = message.user_id, "VK message sent");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        self.api
            .call(
                "groups.getById",
                &[("group_id", self.api.group_id.clone())],
            )
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::StartupFailed {
                name: CHANNEL_NAME.into(),
                reason: e.to_string(),
            })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Unwrap a VK API body into its `response`, mapping `error` objects.
fn check_api_response(body: Value) -> Result<Value, ChannelError> {
    if let Some(err) = body.get("error") {
        return Err(ChannelError::Api {
            name: CHANNEL_NAME.into(),
            code: err.get("error_code").and_then(Value::as_i64).unwrap_or(0),
            message: err
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    body.get("response")
        .cloned()
        .ok_or_else(|| ChannelError::InvalidMessage(format!("no response field in {body}")))
}

/// `ts` comes back as a string from some endpoints and a number from others.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_long_poll_session(response: &Value) -> Option<LongPollSession> {
    Some(LongPollSession {
        server: response.get("server")?.as_str()?.to_string(),
        key: response.get("key")?.as_str()?.to_string(),
        ts: value_to_string(response.get("ts")?)?,
    })
}

fn parse_poll_outcome(body: &Value) -> Option<PollOutcome> {
    if let Some(failed) = body.get("failed").and_then(Value::as_i64) {
        return match failed {
            1 => Some(PollOutcome::Resync {
                ts: value_to_string(body.get("ts")?)?,
            }),
            _ => Some(PollOutcome::Reconnect),
        };
    }
    Some(PollOutcome::Updates {
        ts: value_to_string(body.get("ts")?)?,
        updates: body
            .get("updates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Extract sender, text and attachments from a `message_new` update.
fn parse_message_new(update: &Value) -> Option<(UserId, String, Vec<Attachment>)> {
    if update.get("type").and_then(Value::as_str) != Some("message_new") {
        return None;
    }
    let message = update.get("object")?.get("message")?;
    let user_id = message.get("from_id")?.as_i64()?;
    let text = message
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let attachments = message
        .get("attachments")
        .and_then(Value::as_array)
        .map(|list| list.iter().map(parse_attachment).collect())
        .unwrap_or_default();

    Some((user_id, text, attachments))
}

fn parse_attachment(value: &Value) -> Attachment {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    if kind == "video" {
        let video = value.get("video");
        let owner_id = video.and_then(|v| v.get("owner_id")).and_then(Value::as_i64);
        let id = video.and_then(|v| v.get("id")).and_then(Value::as_i64);
        if let (Some(owner_id), Some(id)) = (owner_id, id) {
            return Attachment::Video { owner_id, id };
        }
        tracing::warn!("VK video attachment without owner_id/id");
    }
    Attachment::Other { kind }
}

/// Form parameters for `messages.send`.
fn send_params(message: &OutgoingMessage, random_id: i32) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("user_id", message.user_id.to_string()),
        ("message", message.text.clone()),
        ("random_id", random_id.to_string()),
    ];
    if let Some(keyboard) = &message.keyboard {
        params.push(("keyboard", keyboard.to_vk_json().to_string()));
    }
    if let Some(attachment) = &message.attachment {
        params.push(("attachment", attachment.clone()));
    }
    params
}

// ── Tests ───────────────────────────────────────────────────────────
