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

//! The host-facing enhancer facade
//!
//! Wires the classifier, group store, captioner, and prompt builder into the
//! three event hooks the host dispatches. Collection and enrichment only act
//! on group chats; private chats pass through untouched.

use roomsense_caption::{CacheStats, CaptionSettings, ImageCaptioner, ProviderRegistry};
use roomsense_core::{
    ChatEvent, EnhancerConfig, GroupMessage, MessageClassifier, ProviderRequest, ProviderResponse,
};
use roomsense_memory::{ContextSnapshot, GroupStore, StoreStats};
use roomsense_prompts::{extract_history, ExtractLimits, PromptBuilder, PromptTemplates, Situation};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The context-enrichment engine a host plugin owns
pub struct Enhancer {
    config: EnhancerConfig,
    classifier: MessageClassifier,
    store: GroupStore,
    snapshot: ContextSnapshot,
    captioner: Option<ImageCaptioner>,
    builder: PromptBuilder,
}

impl Enhancer {
    /// Create an enhancer from host config and the host's caption providers.
    ///
    /// Loads the context snapshot from the configured data directory when one
    /// exists; a broken snapshot is logged and ignored.
    pub async fn new(config: EnhancerConfig, registry: ProviderRegistry) -> Self {
        let store = GroupStore::new(
            config.buffer_capacity(),
            Duration::from_secs(config.cleanup_interval_secs),
        );

        let snapshot = ContextSnapshot::new(config.snapshot_path());
        match snapshot.load() {
            Ok(data) if !data.is_empty() => store.load(data).await,
            Ok(_) => {}
            Err(e) => warn!("failed to load context snapshot: {}", e),
        }

        let captioner = config.enable_image_caption.then(|| {
            ImageCaptioner::new(
                registry,
                CaptionSettings {
                    provider_id: config.caption_provider_id.clone(),
                    prompt: config.caption_prompt.clone(),
                    timeout_secs: config.caption_timeout_secs,
                    cache_capacity: config.caption_cache_capacity,
                },
            )
        });

        let classifier = MessageClassifier::new(config.bot_replies_count > 0);

        info!(
            groups = config.enabled_groups.len(),
            captioning = config.enable_image_caption,
            "context enhancer initialized"
        );

        Self {
            config,
            classifier,
            store,
            snapshot,
            captioner,
            builder: PromptBuilder::default(),
        }
    }

    /// Replace the prompt templates (e.g. to localize)
    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.builder = PromptBuilder::new(templates);
        self
    }

    /// Collect an inbound chat message into the group buffer.
    ///
    /// Classifies the message, captions attached images when enabled, and
    /// appends it with duplicate suppression. Only group chats are buffered.
    pub async fn on_message(&self, event: &ChatEvent) {
        if !event.is_group() || !self.config.is_chat_enabled(event) {
            return;
        }

        let kind = self.classifier.classify(event);
        let mut message = GroupMessage::from_event(event, kind);

        if message.has_image() {
            if let Some(captioner) = &self.captioner {
                message.captions = captioner.caption_all(&message.image_urls).await;
            }
        }

        let preview: String = message.text.chars().take(50).collect();
        if self.store.collect(message).await {
            debug!(
                kind = ?kind,
                sender = %event.sender_name,
                text = %preview,
                "collected group message"
            );
        }
    }

    /// Enrich an outgoing LLM request with buffered room history.
    ///
    /// Idempotent: a prompt that already carries the enrichment header is
    /// left untouched, as is anything outside an enabled group chat.
    pub async fn on_llm_request(&self, event: &ChatEvent, request: &mut ProviderRequest) {
        if self.builder.is_enhanced(&request.prompt) {
            debug!("prompt already enhanced, skipping");
            return;
        }

        if !self.config.is_chat_enabled(event) {
            return;
        }

        let Some(group_id) = event.group_id.as_deref() else {
            return;
        };

        self.store
            .mark_triggered(
                group_id,
                event.message_id.as_deref(),
                &event.sender_id,
                &event.text_content(),
            )
            .await;

        if self.store.is_empty(group_id).await {
            debug!(group_id, "no buffered history, skipping enrichment");
            return;
        }

        let messages = self.store.messages(group_id).await;
        let extract = extract_history(
            &messages,
            &ExtractLimits {
                max_chats: self.config.recent_chats_count,
                max_bot_replies: self.config.bot_replies_count,
            },
        );

        let situation = if event.sender_id.is_empty() {
            Situation::Proactive
        } else {
            Situation::User {
                sender_name: event.sender_name.clone(),
                sender_id: event.sender_id.clone(),
            }
        };

        let enhanced = self.builder.build(&request.prompt, &situation, &extract);
        if enhanced != request.prompt {
            debug!(length = enhanced.len(), "prompt enriched");
            request.prompt = enhanced;
        }

        self.merge_image_urls(&extract.image_urls, request);
    }

    /// Record the bot's own reply so later prompts can see it
    pub async fn on_llm_response(&self, event: &ChatEvent, response: &ProviderResponse) {
        let Some(group_id) = event.group_id.as_deref() else {
            return;
        };

        if response.completion_text.is_empty() {
            debug!(group_id, "empty completion, nothing to record");
            return;
        }

        let preview: String = response.completion_text.chars().take(50).collect();
        let reply = GroupMessage::bot_reply(
            event.self_id.clone(),
            self.config.bot_name.clone(),
            group_id,
            response.completion_text.clone(),
        );
        self.store.append(reply).await;
        debug!(group_id, text = %preview, "recorded bot reply");
    }

    /// Drop all buffered context and delete the snapshot file
    pub async fn clear_context(&self) {
        self.store.clear_all().await;
        if let Err(e) = self.snapshot.remove() {
            error!("failed to remove context snapshot: {}", e);
        }
        info!("context cache cleared");
    }

    /// Persist buffered context for the next start
    pub async fn shutdown(&self) {
        let data = self.store.export().await;
        if let Err(e) = self.snapshot.save(&data) {
            error!("failed to save context snapshot: {}", e);
        }
    }

    /// Buffer statistics
    pub async fn store_stats(&self) -> StoreStats {
        self.store.stats().await
    }

    /// Caption cache statistics, when captioning is enabled
    pub async fn caption_cache_stats(&self) -> Option<CacheStats> {
        match &self.captioner {
            Some(captioner) => Some(captioner.cache_stats().await),
            None => None,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    /// Forward the newest buffered image URLs, deduplicated against the
    /// request's own list and capped by config.
    fn merge_image_urls(&self, buffered: &[String], request: &mut ProviderRequest) {
        let mut seen = HashSet::new();
        let deduped: Vec<&String> = buffered.iter().filter(|u| seen.insert(u.as_str())).collect();

        let start = deduped
            .len()
            .saturating_sub(self.config.max_images_in_context);
        let newest = &deduped[start..];
        if newest.is_empty() {
            return;
        }

        let mut merged = Vec::new();
        let mut seen = HashSet::new();
        for url in newest
            .iter()
            .map(|u| u.as_str())
            .chain(request.image_urls.iter().map(|u| u.as_str()))
        {
            if seen.insert(url) {
                merged.push(url.to_string());
            }
        }

        let added = merged.len().saturating_sub(request.image_urls.len());
        if added > 0 {
            debug!(count = added, "forwarded context images");
        }
        request.image_urls = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roomsense_caption::{CaptionError, CaptionProvider};
    use roomsense_core::Segment;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl CaptionProvider for FixedProvider {
        async fn caption(&self, _prompt: &str, _image_url: &str) -> Result<String, CaptionError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn test_config(data_dir: &std::path::Path) -> EnhancerConfig {
        EnhancerConfig {
            enable_image_caption: false,
            data_dir: data_dir.to_path_buf(),
            ..Default::default()
        }
    }

    async fn enhancer(data_dir: &std::path::Path) -> Enhancer {
        Enhancer::new(test_config(data_dir), ProviderRegistry::new()).await
    }

    fn chat(group: &str, sender_id: &str, sender_name: &str, text: &str) -> ChatEvent {
        ChatEvent::group(group, sender_id, sender_name)
            .self_id("bot-1")
            .text(text)
    }

    #[tokio::test]
    async fn test_request_enrichment_end_to_end() {
        let dir = tempdir().unwrap();
        let enhancer = enhancer(dir.path()).await;

        enhancer.on_message(&chat("g1", "u1", "alice", "morning all")).await;
        enhancer.on_message(&chat("g1", "u2", "bob", "morning alice")).await;
        enhancer
            .on_llm_response(
                &chat("g1", "u1", "alice", ""),
                &ProviderResponse::new("good morning!"),
            )
            .await;

        let trigger = chat("g1", "u3", "carol", "what did I miss?").message_id("m-1").wake();
        enhancer.on_message(&trigger).await;

        let mut request = ProviderRequest::new("what did I miss?");
        enhancer.on_llm_request(&trigger, &mut request).await;

        assert!(request.prompt.starts_with("You are browsing a chat app"));
        assert!(request.prompt.contains("alice: morning all"));
        assert!(request.prompt.contains("bob: morning alice"));
        assert!(request.prompt.contains("you replied: good morning!"));
        assert!(request
            .prompt
            .contains("Now carol (ID: u3) sent a message: what did I miss?"));
        assert!(request.system_prompt.is_empty());
    }

    #[tokio::test]
    async fn test_enrichment_is_idempotent() {
        let dir = tempdir().unwrap();
        let enhancer = enhancer(dir.path()).await;

        enhancer.on_message(&chat("g1", "u1", "alice", "hello")).await;
        let trigger = chat("g1", "u2", "bob", "hey").wake();
        enhancer.on_message(&trigger).await;

        let mut request = ProviderRequest::new("hey");
        enhancer.on_llm_request(&trigger, &mut request).await;
        let once = request.prompt.clone();

        enhancer.on_llm_request(&trigger, &mut request).await;
        assert_eq!(request.prompt, once);
    }

    #[tokio::test]
    async fn test_empty_buffer_leaves_request_untouched() {
        let dir = tempdir().unwrap();
        let enhancer = enhancer(dir.path()).await;

        let trigger = chat("g1", "u1", "alice", "hello?");
        let mut request = ProviderRequest::new("hello?");
        enhancer.on_llm_request(&trigger, &mut request).await;

        assert_eq!(request.prompt, "hello?");
    }

    #[tokio::test]
    async fn test_private_chat_not_enriched() {
        let dir = tempdir().unwrap();
        let enhancer = enhancer(dir.path()).await;

        let private = ChatEvent::private("u1", "alice").text("psst");
        enhancer.on_message(&private).await;

        let mut request = ProviderRequest::new("psst");
        enhancer.on_llm_request(&private, &mut request).await;

        assert_eq!(request.prompt, "psst");
        assert_eq!(enhancer.store_stats().await.message_count, 0);
    }

    #[tokio::test]
    async fn test_disabled_group_not_collected() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.enabled_groups = vec!["g-allowed".to_string()];
        let enhancer = Enhancer::new(config, ProviderRegistry::new()).await;

        enhancer.on_message(&chat("g-other", "u1", "alice", "hi")).await;
        enhancer.on_message(&chat("g-allowed", "u1", "alice", "hi")).await;

        assert_eq!(enhancer.store_stats().await.group_count, 1);
    }

    #[tokio::test]
    async fn test_trigger_re_marked_in_buffer() {
        let dir = tempdir().unwrap();
        let enhancer = enhancer(dir.path()).await;

        // Collected as normal chatter: no wake flag, no mention, no prefix.
        let event = chat("g1", "u1", "alice", "tell me a story").message_id("m-9");
        enhancer.on_message(&event).await;

        let mut request = ProviderRequest::new("tell me a story");
        enhancer.on_llm_request(&event, &mut request).await;

        let messages = enhancer.store.messages("g1").await;
        assert_eq!(messages[0].kind, roomsense_core::MessageKind::Triggered);
    }

    #[tokio::test]
    async fn test_proactive_trigger_without_sender() {
        let dir = tempdir().unwrap();
        let enhancer = enhancer(dir.path()).await;

        enhancer.on_message(&chat("g1", "u1", "alice", "big news today")).await;

        let proactive = ChatEvent::group("g1", "", "").self_id("bot-1");
        let mut request = ProviderRequest::new("the news");
        enhancer.on_llm_request(&proactive, &mut request).await;

        assert!(request
            .prompt
            .contains("proactively share your take on: the news"));
    }

    #[tokio::test]
    async fn test_images_captioned_and_forwarded() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.enable_image_caption = true;
        config.max_images_in_context = 2;

        let mut registry = ProviderRegistry::new();
        registry.register("vision", Arc::new(FixedProvider("a raccoon")));
        let enhancer = Enhancer::new(config, registry).await;

        let event = chat("g1", "u1", "alice", "look").segment(Segment::Image {
            url: "https://example.com/a.png".to_string(),
        });
        enhancer.on_message(&event).await;

        let trigger = chat("g1", "u2", "bob", "what is that?").wake();
        enhancer.on_message(&trigger).await;

        let mut request = ProviderRequest::new("what is that?");
        request.image_urls.push("https://example.com/mine.png".to_string());
        enhancer.on_llm_request(&trigger, &mut request).await;

        assert!(request.prompt.contains("alice: look [image: a raccoon]"));
        assert_eq!(
            request.image_urls,
            vec![
                "https://example.com/a.png".to_string(),
                "https://example.com/mine.png".to_string()
            ]
        );
        assert_eq!(enhancer.caption_cache_stats().await.unwrap().entry_count, 1);
    }

    #[tokio::test]
    async fn test_image_cap_keeps_newest() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.max_images_in_context = 1;
        let enhancer = Enhancer::new(config, ProviderRegistry::new()).await;

        for i in 0..3 {
            let event = chat("g1", "u1", "alice", &format!("pic {i}")).segment(Segment::Image {
                url: format!("https://example.com/{i}.png"),
            });
            enhancer.on_message(&event).await;
        }

        let trigger = chat("g1", "u2", "bob", "nice pics").wake();
        enhancer.on_message(&trigger).await;

        let mut request = ProviderRequest::new("nice pics");
        enhancer.on_llm_request(&trigger, &mut request).await;

        assert_eq!(request.image_urls, vec!["https://example.com/2.png".to_string()]);
    }

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let dir = tempdir().unwrap();

        {
            let enhancer = enhancer(dir.path()).await;
            enhancer.on_message(&chat("g1", "u1", "alice", "remember me")).await;
            enhancer.shutdown().await;
        }

        let revived = enhancer(dir.path()).await;
        let trigger = chat("g1", "u2", "bob", "anything logged?").wake();
        revived.on_message(&trigger).await;

        let mut request = ProviderRequest::new("anything logged?");
        revived.on_llm_request(&trigger, &mut request).await;

        assert!(request.prompt.contains("alice: remember me"));
    }

    #[tokio::test]
    async fn test_clear_context_removes_history_and_snapshot() {
        let dir = tempdir().unwrap();
        let enhancer = enhancer(dir.path()).await;

        enhancer.on_message(&chat("g1", "u1", "alice", "hello")).await;
        enhancer.shutdown().await;
        assert!(enhancer.config().snapshot_path().exists());

        enhancer.clear_context().await;

        assert_eq!(enhancer.store_stats().await.message_count, 0);
        assert!(!enhancer.config().snapshot_path().exists());
    }
}
