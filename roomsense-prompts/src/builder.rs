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

//! Prompt assembly
//!
//! The enriched prompt always reads in the same order: header, recent chat
//! lines, the bot's recent replies, a situation line carrying the original
//! prompt, and a closing instruction. Empty sections are omitted. The header
//! is also the double-enhancement guard: a prompt that already contains it is
//! left alone.

use crate::extract::HistoryExtract;
use serde::{Deserialize, Serialize};

/// Template strings for prompt assembly.
///
/// `{sender_name}`, `{sender_id}`, and `{original_prompt}` placeholders are
/// substituted in the trigger templates. Hosts can swap the whole set, e.g.
/// to localize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub header: String,
    pub recent_chats_header: String,
    pub bot_replies_header: String,
    pub user_trigger: String,
    pub proactive_trigger: String,
    pub footer: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            header: "You are browsing a chat app, reading the latest group messages.".to_string(),
            recent_chats_header: "\nRecent messages:".to_string(),
            bot_replies_header: "\nYour recent replies:".to_string(),
            user_trigger: "\nNow {sender_name} (ID: {sender_id}) sent a message: {original_prompt}"
                .to_string(),
            proactive_trigger:
                "\nBased on the chat history above, proactively share your take on: {original_prompt}"
                    .to_string(),
            footer: "Work out what is actually being discussed, who is talking to whom, and \
                     whether you are replying or butting in, then respond as naturally as your \
                     persona allows."
                .to_string(),
        }
    }
}

/// Who the enriched prompt is answering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Situation {
    /// A named member triggered the request
    User {
        sender_name: String,
        sender_id: String,
    },
    /// No sender: the host asked the bot to speak up on its own
    Proactive,
}

/// Assembles enriched prompts
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    templates: PromptTemplates,
}

impl PromptBuilder {
    /// Create a builder with the given templates
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    /// Whether a prompt has already been enhanced
    pub fn is_enhanced(&self, prompt: &str) -> bool {
        prompt.contains(&self.templates.header)
    }

    /// Build the enriched prompt around the original one
    pub fn build(
        &self,
        original_prompt: &str,
        situation: &Situation,
        extract: &HistoryExtract,
    ) -> String {
        let mut parts: Vec<String> = vec![self.templates.header.clone()];

        if !extract.recent_chats.is_empty() {
            parts.push(self.templates.recent_chats_header.clone());
            parts.extend(extract.recent_chats.iter().cloned());
        }

        if !extract.bot_replies.is_empty() {
            parts.push(self.templates.bot_replies_header.clone());
            parts.extend(extract.bot_replies.iter().cloned());
        }

        parts.push(self.situation_line(original_prompt, situation));
        parts.push(self.templates.footer.clone());

        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn situation_line(&self, original_prompt: &str, situation: &Situation) -> String {
        match situation {
            Situation::User {
                sender_name,
                sender_id,
            } => self
                .templates
                .user_trigger
                .replace("{sender_name}", sender_name)
                .replace("{sender_id}", sender_id)
                .replace("{original_prompt}", original_prompt),
            Situation::Proactive => self
                .templates
                .proactive_trigger
                .replace("{original_prompt}", original_prompt),
        }
    }
}
