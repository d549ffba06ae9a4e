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

//! Enhancer configuration
//!
//! The host declares a config schema and hands the engine the resulting JSON
//! object. Every field is defaulted so a partial or malformed object degrades
//! to sensible behavior instead of disabling the plugin.

use crate::event::ChatEvent;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Extra buffer headroom over the configured context window, so bursts do not
/// immediately evict messages the next prompt would have used.
pub const LOAD_BUFFER_MULTIPLIER: usize = 2;

/// Configuration for the enrichment engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    /// Groups the enhancer is active in; empty means all groups
    pub enabled_groups: Vec<String>,

    /// How many recent chat messages go into the prompt
    pub recent_chats_count: usize,

    /// How many of the bot's own replies go into the prompt
    pub bot_replies_count: usize,

    /// Cap on image URLs forwarded with the request
    pub max_images_in_context: usize,

    /// Whether to caption images through a secondary LLM call
    pub enable_image_caption: bool,

    /// Provider id for captioning; empty selects the host's default provider
    pub caption_provider_id: String,

    /// Prompt sent to the caption provider
    pub caption_prompt: String,

    /// Timeout for a single caption call, in seconds
    pub caption_timeout_secs: u64,

    /// Bounded size of the caption cache
    pub caption_cache_capacity: usize,

    /// Minimum seconds between inactive-group sweeps
    pub cleanup_interval_secs: u64,

    /// Name used when recording the bot's own replies
    pub bot_name: String,

    /// Directory holding the context snapshot file
    pub data_dir: PathBuf,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            enabled_groups: Vec::new(),
            recent_chats_count: 15,
            bot_replies_count: 5,
            max_images_in_context: 4,
            enable_image_caption: true,
            caption_provider_id: String::new(),
            caption_prompt:
                "Briefly describe the main content of this image, focusing on anything relevant to a chat conversation."
                    .to_string(),
            caption_timeout_secs: 10,
            caption_cache_capacity: 256,
            cleanup_interval_secs: 600,
            bot_name: "assistant".to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl EnhancerConfig {
    /// Deserialize a host-supplied config object, falling back to defaults
    /// when the object as a whole does not parse.
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                warn!("invalid enhancer config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Whether enrichment is active for the chat behind this event.
    ///
    /// Private chats are always enabled; groups pass when the allow-list is
    /// empty or contains the group id.
    pub fn is_chat_enabled(&self, event: &ChatEvent) -> bool {
        match &event.group_id {
            None => true,
            Some(group_id) => {
                self.enabled_groups.is_empty() || self.enabled_groups.contains(group_id)
            }
        }
    }

    /// Per-group buffer capacity derived from the context window
    pub fn buffer_capacity(&self) -> usize {
        (self.recent_chats_count + self.bot_replies_count).max(1) * LOAD_BUFFER_MULTIPLIER
    }

    /// Path of the flat snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("context_cache.json")
    }
}
