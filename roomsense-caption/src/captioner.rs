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

//! Caption orchestration
//!
//! Wraps provider selection, the content-hash cache, and a hard timeout into
//! one call that either returns a caption or `None`. Callers never see an
//! error: a missing caption is an acceptable outcome for prompt assembly.

use crate::cache::{content_hash, CacheStats, CaptionCache};
use crate::provider::{CaptionError, ProviderRegistry};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Settings for the captioner, lifted from the plugin config
#[derive(Debug, Clone)]
pub struct CaptionSettings {
    /// Provider id; empty selects the registry default
    pub provider_id: String,
    /// Prompt sent alongside each image
    pub prompt: String,
    /// Hard deadline per provider call, in seconds
    pub timeout_secs: u64,
    /// Caption cache capacity
    pub cache_capacity: usize,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            provider_id: String::new(),
            prompt: "Briefly describe the main content of this image.".to_string(),
            timeout_secs: 10,
            cache_capacity: 256,
        }
    }
}

/// Generates and memoizes image captions
pub struct ImageCaptioner {
    registry: ProviderRegistry,
    settings: CaptionSettings,
    cache: Mutex<CaptionCache>,
}

impl ImageCaptioner {
    /// Create a captioner over a provider registry
    pub fn new(registry: ProviderRegistry, settings: CaptionSettings) -> Self {
        let cache = Mutex::new(CaptionCache::new(settings.cache_capacity));
        Self {
            registry,
            settings,
            cache,
        }
    }

    /// Caption one image, returning `None` on any failure.
    pub async fn caption(&self, image_url: &str) -> Option<String> {
        let key = content_hash(image_url);

        if let Some(cached) = self.cache.lock().await.get(&key) {
            debug!(key = %key, "caption cache hit");
            return Some(cached);
        }

        let provider = match self.registry.get(&self.settings.provider_id) {
            Some(provider) => provider,
            None => {
                warn!(
                    provider_id = %self.settings.provider_id,
                    "no caption provider available"
                );
                return None;
            }
        };

        let deadline = Duration::from_secs(self.settings.timeout_secs);
        let call = provider.caption(&self.settings.prompt, image_url);
        let result = match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(CaptionError::Timeout(self.settings.timeout_secs)),
        };

        match result {
            Ok(caption) if !caption.is_empty() => {
                self.cache.lock().await.insert(key, caption.clone());
                Some(caption)
            }
            Ok(_) => {
                debug!("provider returned an empty caption");
                None
            }
            Err(e) => {
                warn!(provider = provider.name(), "caption call failed: {}", e);
                None
            }
        }
    }

    /// Caption a batch of images, substituting numbered placeholders.
    ///
    /// The output is always the same length as the input so callers can zip
    /// it against the image list.
    pub async fn caption_all(&self, image_urls: &[String]) -> Vec<String> {
        let mut captions = Vec::with_capacity(image_urls.len());
        for (i, url) in image_urls.iter().enumerate() {
            let caption = self
                .caption(url)
                .await
                .unwrap_or_else(|| format!("image {}", i + 1));
            captions.push(caption);
        }
        captions
    }

    /// Cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    /// Drop all cached captions
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CaptionProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        reply: Result<&'static str, ()>,
        delay: Duration,
    }

    #[async_trait]
    impl CaptionProvider for CountingProvider {
        async fn caption(&self, _prompt: &str, _image_url: &str) -> Result<String, CaptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(CaptionError::Provider("boom".to_string())),
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn captioner_with(
        reply: Result<&'static str, ()>,
        delay: Duration,
        timeout_secs: u64,
    ) -> (ImageCaptioner, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ProviderRegistry::new();
        registry.register(
            "test",
            Arc::new(CountingProvider {
                calls: calls.clone(),
                reply,
                delay,
            }),
        );

        let settings = CaptionSettings {
            timeout_secs,
            ..Default::default()
        };
        (ImageCaptioner::new(registry, settings), calls)
    }

    #[tokio::test]
    async fn test_cache_avoids_repeat_calls() {
        let (captioner, calls) = captioner_with(Ok("a dog"), Duration::ZERO, 5);

        assert_eq!(captioner.caption("img-1").await.as_deref(), Some("a dog"));
        assert_eq!(captioner.caption("img-1").await.as_deref(), Some("a dog"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = captioner.cache_stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_none() {
        let (captioner, _) = captioner_with(Err(()), Duration::ZERO, 5);
        assert!(captioner.caption("img-1").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades_to_none() {
        let (captioner, _) = captioner_with(Ok("too late"), Duration::from_secs(30), 1);
        assert!(captioner.caption("img-1").await.is_none());
    }

    #[tokio::test]
    async fn test_no_provider_degrades_to_none() {
        let captioner = ImageCaptioner::new(ProviderRegistry::new(), CaptionSettings::default());
        assert!(captioner.caption("img-1").await.is_none());
    }

    #[tokio::test]
    async fn test_caption_all_substitutes_placeholders() {
        let (captioner, _) = captioner_with(Err(()), Duration::ZERO, 5);
        let captions = captioner
            .caption_all(&["a".to_string(), "b".to_string()])
            .await;

        assert_eq!(captions, vec!["image 1".to_string(), "image 2".to_string()]);
    }
}
