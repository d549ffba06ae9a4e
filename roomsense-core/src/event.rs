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

//! Host-boundary event model
//!
//! `ChatEvent` is the engine's view of one inbound message, already flattened
//! by the host adapter into a list of [`Segment`]s. `ProviderRequest` and
//! `ProviderResponse` mirror the host's LLM hook payloads: the engine mutates
//! the request's prompt and image list in place and never touches the system
//! prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One component of a chat message, mirroring the host's message chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text
    Plain { text: String },
    /// Mention of a single member
    At { target: String, name: Option<String> },
    /// Mention of everyone
    AtAll,
    /// An image, by URL, local path, or data URL
    Image { url: String },
    /// A quoted reply to an earlier message
    Reply {
        sender_id: String,
        sender_name: Option<String>,
        text: String,
    },
    /// A sticker/emoji face
    Face { id: i64 },
    /// A voice clip
    Record,
    /// A video clip
    Video,
    /// Any segment kind the adapter does not model explicitly
    Other { kind: String },
}

impl Segment {
    /// Plain-text rendering used when buffering message content.
    ///
    /// Non-text segments become bracketed placeholders so the buffered line
    /// keeps as much signal as possible without embedding binary payloads.
    pub fn outline(&self) -> String {
        match self {
            Segment::Plain { text } => text.clone(),
            Segment::At { target, name } => match name {
                Some(name) => format!("[@{}({})]", target, name),
                None => format!("@{}", target),
            },
            Segment::AtAll => "[@everyone]".to_string(),
            Segment::Image { .. } => String::new(),
            Segment::Reply {
                sender_id,
                sender_name,
                text,
            } => {
                let sender = match sender_name {
                    Some(name) => format!("{}({})", name, sender_id),
                    None => sender_id.clone(),
                };
                format!("[reply to {}: {}]", sender, text)
            }
            Segment::Face { id } => format!("[face:{}]", id),
            Segment::Record => "[voice]".to_string(),
            Segment::Video => "[video]".to_string(),
            Segment::Other { kind } => format!("[{}]", kind),
        }
    }
}

/// An inbound chat event as delivered by the host adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Group id; `None` for private chats
    pub group_id: Option<String>,
    /// Sender id; empty for synthetic/proactive events
    pub sender_id: String,
    /// Display name of the sender
    pub sender_name: String,
    /// The bot's own account id
    pub self_id: String,
    /// Host-assigned message id, when available
    pub message_id: Option<String>,
    /// Message components
    pub segments: Vec<Segment>,
    /// Whether the host already decided this message wakes the bot
    pub is_wake: bool,
    /// Receive time
    pub timestamp: DateTime<Utc>,
}

impl ChatEvent {
    /// Create a group-chat event
    pub fn group(
        group_id: impl Into<String>,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            group_id: Some(group_id.into()),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            self_id: String::new(),
            message_id: None,
            segments: Vec::new(),
            is_wake: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a private-chat event
    pub fn private(sender_id: impl Into<String>, sender_name: impl Into<String>) -> Self {
        Self {
            group_id: None,
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            self_id: String::new(),
            message_id: None,
            segments: Vec::new(),
            is_wake: false,
            timestamp: Utc::now(),
        }
    }

    /// Set the bot's own id
    pub fn self_id(mut self, self_id: impl Into<String>) -> Self {
        self.self_id = self_id.into();
        self
    }

    /// Set the host message id
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Append a segment
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Append a plain-text segment
    pub fn text(self, text: impl Into<String>) -> Self {
        self.segment(Segment::Plain { text: text.into() })
    }

    /// Mark the event as already waking the bot
    pub fn wake(mut self) -> Self {
        self.is_wake = true;
        self
    }

    /// Whether this event belongs to a group chat
    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// Plain-text content of the message, with placeholders for rich segments
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(&segment.outline());
        }
        out.trim().to_string()
    }

    /// URLs of all image segments, in order
    pub fn image_urls(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Image { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any segment is an image
    pub fn contains_image(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Image { .. }))
    }
}

/// Outgoing LLM request, as seen by the enhancement hook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The user-facing prompt the host is about to send
    pub prompt: String,
    /// The host's persona/system prompt; the engine never modifies this
    pub system_prompt: String,
    /// Image URLs attached to the request
    pub image_urls: Vec<String>,
}

impl ProviderRequest {
    /// Create a request from a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: String::new(),
            image_urls: Vec::new(),
        }
    }
}

/// Completed LLM response, as seen by the recording hook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The completion text the bot is about to send
    pub completion_text: String,
}

impl ProviderResponse {
    /// Create a response from completion text
    pub fn new(completion_text: impl Into<String>) -> Self {
        Self {
            completion_text: completion_text.into(),
        }
    }
}
