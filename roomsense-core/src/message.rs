// Copyright 2025 Roomsense Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Buffered message record
//!
//! `GroupMessage` is the atomic unit the engine keeps per group: a flattened,
//! framework-decoupled copy of a chat message, classified by [`MessageKind`].
//! Records serialize to JSON for the flat snapshot file; decoding is lenient
//! so an old snapshot never blocks startup.

use crate::event::ChatEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a buffered message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Ordinary chatter, collected for ambience
    Normal,
    /// A message that wakes the LLM (mention, wake word, or command)
    Triggered,
    /// A message carrying at least one image
    Image,
    /// The bot's own reply
    BotReply,
}

impl Default for MessageKind {
    fn default() -> Self {
        Self::Normal
    }
}

impl MessageKind {
    /// Whether this kind counts toward the recent-chats section of a prompt
    pub fn is_chat(&self) -> bool {
        matches!(
            self,
            MessageKind::Normal | MessageKind::Triggered | MessageKind::Image
        )
    }
}

/// A chat message buffered for context enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessage {
    /// Host-assigned message id, when available
    #[serde(default)]
    pub id: Option<String>,
    /// Classification
    #[serde(default)]
    pub kind: MessageKind,
    /// When the message was received
    pub timestamp: DateTime<Utc>,
    /// Sender account id
    #[serde(default)]
    pub sender_id: String,
    /// Sender display name
    #[serde(default)]
    pub sender_name: String,
    /// Group this message belongs to
    #[serde(default)]
    pub group_id: String,
    /// Flattened text content
    #[serde(default)]
    pub text: String,
    /// URLs of attached images
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Generated captions, parallel to `image_urls` when captioning succeeded
    #[serde(default)]
    pub captions: Vec<String>,
}

impl GroupMessage {
    /// Create an empty message of the given kind
    pub fn new(
        kind: MessageKind,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind,
            timestamp: Utc::now(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            group_id: group_id.into(),
            text: String::new(),
            image_urls: Vec::new(),
            captions: Vec::new(),
        }
    }

    /// Build a record from an inbound event
    pub fn from_event(event: &ChatEvent, kind: MessageKind) -> Self {
        Self {
            id: event.message_id.clone(),
            kind,
            timestamp: event.timestamp,
            sender_id: event.sender_id.clone(),
            sender_name: event.sender_name.clone(),
            group_id: event.group_id.clone().unwrap_or_default(),
            text: event.text_content(),
            image_urls: event.image_urls(),
            captions: Vec::new(),
        }
    }

    /// Build a bot-reply record from completion text
    pub fn bot_reply(
        self_id: impl Into<String>,
        bot_name: impl Into<String>,
        group_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind: MessageKind::BotReply,
            timestamp: Utc::now(),
            sender_id: self_id.into(),
            sender_name: bot_name.into(),
            group_id: group_id.into(),
            text: text.into(),
            image_urls: Vec::new(),
            captions: Vec::new(),
        }
    }

    /// Set the text content
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach an image URL
    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }

    /// Whether the message carries any image
    pub fn has_image(&self) -> bool {
        !self.image_urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Segment;

    #[test]
    fn test_from_event_flattens_segments() {
        let event = ChatEvent::group("g1", "u1", "alice")
            .message_id("m-1")
            .text("hello ")
            .segment(Segment::At {
                target: "7".to_string(),
                name: None,
            })
            .segment(Segment::Image {
                url: "https://example.com/cat.png".to_string(),
            });

        let msg = GroupMessage::from_event(&event, MessageKind::Image);

        assert_eq!(msg.id.as_deref(), Some("m-1"));
        assert_eq!(msg.kind, MessageKind::Image);
        assert_eq!(msg.group_id, "g1");
        assert_eq!(msg.text, "hello @7");
        assert!(msg.has_image());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let msg = GroupMessage::new(MessageKind::Triggered, "u1", "alice", "g1")
            .text("ping")
            .image("https://example.com/a.png");

        let json = serde_json::to_string(&msg).unwrap();
        let back: GroupMessage = serde_json::from_str(&json).unwrap();

        assert_eq!(back.kind, MessageKind::Triggered);
        assert_eq!(back.text, "ping");
        assert_eq!(back.image_urls, msg.image_urls);
    }

    #[test]
    fn test_lenient_decode_defaults_missing_fields() {
        let json = r#"{"timestamp":"2025-01-01T00:00:00Z","text":"old entry"}"#;
        let msg: GroupMessage = serde_json::from_str(json).unwrap();

        assert_eq!(msg.kind, MessageKind::Normal);
        assert_eq!(msg.text, "old entry");
        assert!(msg.sender_id.is_empty());
        assert!(!msg.has_image());
    }

    #[test]
    fn test_kind_is_chat() {
        assert!(MessageKind::Normal.is_chat());
        assert!(MessageKind::Triggered.is_chat());
        assert!(MessageKind::Image.is_chat());
        assert!(!MessageKind::BotReply.is_chat());
    }
}
