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

//! History extraction
//!
//! Scans a group's buffer newest-first, filling two independent quotas — chat
//! lines and bot replies — then restores chronological order. Image URLs ride
//! along with the chat lines they came from so the engine can forward them
//! with the request.

use roomsense_core::{GroupMessage, MessageKind};

/// Per-kind quotas for extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    /// Maximum chat lines (normal, triggered, and image messages)
    pub max_chats: usize,
    /// Maximum bot-reply lines
    pub max_bot_replies: usize,
}

/// Extracted history, chronological within each section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryExtract {
    /// Rendered chat lines: `sender: text [image: caption]`
    pub recent_chats: Vec<String>,
    /// Rendered bot replies: `you replied: text`
    pub bot_replies: Vec<String>,
    /// Image URLs from the selected chat lines, oldest first, undeduplicated
    pub image_urls: Vec<String>,
}

impl HistoryExtract {
    /// Whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.recent_chats.is_empty() && self.bot_replies.is_empty()
    }
}

/// Render one chat message as a prompt line.
///
/// Returns `None` when the message has neither text nor captions; such
/// messages still contribute their image URLs.
fn render_chat_line(message: &GroupMessage) -> Option<String> {
    let caption_part = if message.captions.is_empty() {
        String::new()
    } else {
        format!(" [image: {}]", message.captions.join("; "))
    };

    if message.text.is_empty() && caption_part.is_empty() {
        return None;
    }

    Some(format!(
        "{}: {}{}",
        message.sender_name, message.text, caption_part
    ))
}

/// Select recent history from a chronological buffer under the given quotas
pub fn extract_history(messages: &[GroupMessage], limits: &ExtractLimits) -> HistoryExtract {
    let mut recent_chats = Vec::new();
    let mut bot_replies = Vec::new();
    let mut image_urls = Vec::new();

    for message in messages.iter().rev() {
        if recent_chats.len() < limits.max_chats && message.kind.is_chat() {
            if let Some(line) = render_chat_line(message) {
                recent_chats.push(line);
            }
            for url in &message.image_urls {
                image_urls.push(url.clone());
            }
        } else if bot_replies.len() < limits.max_bot_replies
            && message.kind == MessageKind::BotReply
        {
            bot_replies.push(format!("you replied: {}", message.text));
        }

        if recent_chats.len() >= limits.max_chats && bot_replies.len() >= limits.max_bot_replies {
            break;
        }
    }

    recent_chats.reverse();
    bot_replies.reverse();
    image_urls.reverse();

    HistoryExtract {
        recent_chats,
        bot_replies,
        image_urls,
    }
}
