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

//! Message classification
//!
//! Decides, for each inbound event, which [`MessageKind`] it gets buffered as.
//! Ordering matters: the bot's own messages win over everything, images win
//! over trigger detection, and anything else that wakes the LLM is `Triggered`.

use crate::event::{ChatEvent, Segment};
use crate::message::MessageKind;

/// Command prefixes that wake the bot without a mention
pub const COMMAND_PREFIXES: &[&str] = &["/", "!", "！", "#", ".", "。"];

/// Classifies inbound events into buffer kinds
#[derive(Debug, Clone)]
pub struct MessageClassifier {
    /// When false, the bot's own messages are classified like anyone else's
    collect_bot_replies: bool,
}

impl Default for MessageClassifier {
    fn default() -> Self {
        Self {
            collect_bot_replies: true,
        }
    }
}

impl MessageClassifier {
    /// Create a classifier
    pub fn new(collect_bot_replies: bool) -> Self {
        Self {
            collect_bot_replies,
        }
    }

    /// Classify an inbound event
    pub fn classify(&self, event: &ChatEvent) -> MessageKind {
        if self.collect_bot_replies && Self::is_bot_message(event) {
            return MessageKind::BotReply;
        }

        if event.contains_image() {
            return MessageKind::Image;
        }

        if self.is_triggered(event) {
            return MessageKind::Triggered;
        }

        MessageKind::Normal
    }

    /// Whether the event was sent by the bot itself
    pub fn is_bot_message(event: &ChatEvent) -> bool {
        !event.self_id.is_empty() && event.sender_id == event.self_id
    }

    /// Whether the event will wake the LLM
    pub fn is_triggered(&self, event: &ChatEvent) -> bool {
        // Host wake flag is authoritative and cheapest to check.
        if event.is_wake {
            return true;
        }

        if Self::is_at_triggered(event) {
            return true;
        }

        Self::is_command_triggered(event)
    }

    fn is_at_triggered(event: &ChatEvent) -> bool {
        event.segments.iter().any(|segment| match segment {
            Segment::At { target, .. } => {
                !event.self_id.is_empty() && *target == event.self_id || target == "all"
            }
            Segment::AtAll => true,
            _ => false,
        })
    }

    fn is_command_triggered(event: &ChatEvent) -> bool {
        let text = event.text_content().to_lowercase();
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        COMMAND_PREFIXES
            .iter()
            .any(|prefix| text.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> MessageClassifier {
        MessageClassifier::new(true)
    }

    #[test]
    fn test_bot_message_wins() {
        let event = ChatEvent::group("g1", "bot-1", "assistant")
            .self_id("bot-1")
            .text("/help")
            .segment(Segment::Image {
                url: "x.png".to_string(),
            });

        assert_eq!(classifier().classify(&event), MessageKind::BotReply);
    }

    #[test]
    fn test_bot_collection_disabled() {
        let event = ChatEvent::group("g1", "bot-1", "assistant")
            .self_id("bot-1")
            .text("just chatting");

        let classifier = MessageClassifier::new(false);
        assert_eq!(classifier.classify(&event), MessageKind::Normal);
    }

    #[test]
    fn test_image_beats_trigger() {
        let event = ChatEvent::group("g1", "u1", "alice")
            .self_id("bot-1")
            .text("!meme")
            .segment(Segment::Image {
                url: "meme.png".to_string(),
            });

        assert_eq!(classifier().classify(&event), MessageKind::Image);
    }

    #[test]
    fn test_wake_flag_triggers() {
        let event = ChatEvent::group("g1", "u1", "alice").text("hey bot").wake();
        assert_eq!(classifier().classify(&event), MessageKind::Triggered);
    }

    #[test]
    fn test_at_bot_triggers() {
        let event = ChatEvent::group("g1", "u1", "alice")
            .self_id("bot-1")
            .segment(Segment::At {
                target: "bot-1".to_string(),
                name: None,
            })
            .text(" what do you think?");

        assert_eq!(classifier().classify(&event), MessageKind::Triggered);
    }

    #[test]
    fn test_at_other_member_does_not_trigger() {
        let event = ChatEvent::group("g1", "u1", "alice")
            .self_id("bot-1")
            .segment(Segment::At {
                target: "u2".to_string(),
                name: None,
            })
            .text(" see you there");

        assert_eq!(classifier().classify(&event), MessageKind::Normal);
    }

    #[test]
    fn test_at_all_triggers() {
        let event = ChatEvent::group("g1", "u1", "alice")
            .self_id("bot-1")
            .segment(Segment::AtAll)
            .text(" meeting at 5");

        assert_eq!(classifier().classify(&event), MessageKind::Triggered);
    }

    #[test]
    fn test_command_prefixes_trigger() {
        for prefix in ["/status", "!roll", "！帮助", "#tag", ".ping", "。查询"] {
            let event = ChatEvent::group("g1", "u1", "alice").text(prefix);
            assert_eq!(
                classifier().classify(&event),
                MessageKind::Triggered,
                "prefix case: {prefix}"
            );
        }
    }

    #[test]
    fn test_plain_chatter_is_normal() {
        let event = ChatEvent::group("g1", "u1", "alice").text("lunch anyone?");
        assert_eq!(classifier().classify(&event), MessageKind::Normal);
    }

    #[test]
    fn test_empty_text_is_normal() {
        let event = ChatEvent::group("g1", "u1", "alice");
        assert_eq!(classifier().classify(&event), MessageKind::Normal);
    }
}
