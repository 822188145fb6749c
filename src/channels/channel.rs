//! Channel trait and the message types exchanged with the messaging platform.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::channels::keyboard::Keyboard;
use crate::error::ChannelError;

/// Platform user identifier.
pub type UserId = i64;

/// Stream of inbound events produced by a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingEvent> + Send>>;

/// An attachment on an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Video { owner_id: i64, id: i64 },
    Other { kind: String },
}

impl Attachment {
    /// Channel reference token that can be re-attached to an outgoing message.
    pub fn video_reference(&self) -> Option<String> {
        match self {
            Self::Video { owner_id, id } => Some(format!("video{owner_id}_{id}")),
            Self::Other { .. } => None,
        }
    }
}

/// An inbound message from a user.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub user_id: UserId,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub display_name: String,
}

impl IncomingEvent {
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            attachments: Vec::new(),
            display_name: display_name(user_id, None, None),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Reference of the first video attachment, if any.
    pub fn video_reference(&self) -> Option<String> {
        self.attachments.iter().find_map(Attachment::video_reference)
    }
}

/// An outbound message to a user.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub user_id: UserId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub attachment: Option<String>,
}

impl OutgoingMessage {
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            keyboard: None,
            attachment: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Option<Keyboard>) -> Self {
        self.keyboard = keyboard;
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }
}

/// A messaging platform the bot talks through.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logging.
    fn name(&self) -> &str;

    /// Start receiving inbound events.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver one outbound message.
    async fn send(&self, message: OutgoingMessage) -> Result<(), ChannelError>;

    /// Verify credentials and connectivity.
    async fn health_check(&self) -> Result<(), ChannelError>;
}

/// Human-readable name for a user: "First Last", or a placeholder with the id.
pub fn display_name(user_id: UserId, first_name: Option<&str>, last_name: Option<&str>) -> String {
    let full = format!(
        "{} {}",
        first_name.unwrap_or_default(),
        last_name.unwrap_or_default()
    );
    let full = full.trim();
    if full.is_empty() {
        format!("Пользователь {user_id}")
    } else {
        full.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_first_and_last() {
        assert_eq!(display_name(7, Some("Анна"), Some("Петрова")), "Анна Петрова");
    }

    #[test]
    fn display_name_tolerates_missing_parts() {
        assert_eq!(display_name(7, Some("Анна"), None), "Анна");
        assert_eq!(display_name(7, None, Some("Петрова")), "Петрова");
        assert_eq!(display_name(7, Some("  "), Some("")), "Пользователь 7");
        assert_eq!(display_name(42, None, None), "Пользователь 42");
    }

    #[test]
    fn video_reference_formats_owner_and_id() {
        let video = Attachment::Video {
            owner_id: -123,
            id: 456,
        };
        assert_eq!(video.video_reference().as_deref(), Some("video-123_456"));
        assert_eq!(
            Attachment::Other {
                kind: "photo".into()
            }
            .video_reference(),
            None
        );
    }

    #[test]
    fn event_picks_first_video() {
        let event = IncomingEvent::new(1, "")
            .with_attachment(Attachment::Other {
                kind: "photo".into(),
            })
            .with_attachment(Attachment::Video { owner_id: 1, id: 2 })
            .with_attachment(Attachment::Video { owner_id: 3, id: 4 });
        assert_eq!(event.video_reference().as_deref(), Some("video1_2"));
    }

    #[test]
    fn event_without_video_has_no_reference() {
        let event = IncomingEvent::new(1, "hello");
        assert!(event.video_reference().is_none());
        assert_eq!(event.display_name, "Пользователь 1");
    }
}
