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

//! Caption provider abstraction
//!
//! Mirrors the host framework's provider registry: providers are keyed by id,
//! an empty id selects the default. Images are passed as URL strings; a
//! `data:` URL carries inline base64 content.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from caption providers
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Caption request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for vision-capable LLM providers used for captioning
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Produce a short description of the image at `image_url`
    async fn caption(&self, prompt: &str, image_url: &str) -> Result<String, CaptionError>;

    /// Provider name, for logging
    fn name(&self) -> &str;
}

/// Provider lookup keyed by id, mirroring the host's provider abstraction
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CaptionProvider>>,
    default_id: Option<String>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under an id; the first registration becomes the default
    pub fn register(&mut self, id: impl Into<String>, provider: Arc<dyn CaptionProvider>) {
        let id = id.into();
        if self.default_id.is_none() {
            self.default_id = Some(id.clone());
        }
        self.providers.insert(id, provider);
    }

    /// Make an already-registered id the default
    pub fn set_default(&mut self, id: impl Into<String>) {
        self.default_id = Some(id.into());
    }

    /// Look up a provider; an empty id selects the default
    pub fn get(&self, id: &str) -> Option<Arc<dyn CaptionProvider>> {
        if id.is_empty() {
            let default_id = self.default_id.as_deref()?;
            self.providers.get(default_id).cloned()
        } else {
            self.providers.get(id).cloned()
        }
    }

    /// Whether any provider is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// OpenAI-compatible chat-completions provider
pub struct OpenAiCaptionProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCaptionProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at a compatible endpoint (proxy, local gateway, etc.)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl CaptionProvider for OpenAiCaptionProvider {
    async fn caption(&self, prompt: &str, image_url: &str) -> Result<String, CaptionError> {
        let request = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        { "type": "image_url", "image_url": { "url": image_url } }
                    ]
                }
            ],
            "max_tokens": 300,
            "temperature": 0.2
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(CaptionError::RateLimitExceeded);
            }
            return Err(CaptionError::Provider(error_text));
        }

        let response_data: serde_json::Value = response.json().await?;

        let content = response_data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(CaptionError::InvalidResponse("Missing content".to_string()))?
            .trim()
            .to_string();

        Ok(content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Anthropic messages-API provider
pub struct AnthropicCaptionProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicCaptionProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://api.anthropic.com/v1".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Anthropic distinguishes inline base64 from fetched URLs in the source block
    fn image_source(image_url: &str) -> serde_json::Value {
        if let Some(rest) = image_url.strip_prefix("data:") {
            let media_type = rest.split(';').next().unwrap_or("image/png");
            let data = rest.split("base64,").nth(1).unwrap_or_default();
            serde_json::json!({
                "type": "base64",
                "media_type": media_type,
                "data": data
            })
        } else {
            serde_json::json!({
                "type": "url",
                "url": image_url
            })
        }
    }
}

#[async_trait]
impl CaptionProvider for AnthropicCaptionProvider {
    async fn caption(&self, prompt: &str, image_url: &str) -> Result<String, CaptionError> {
        let request = serde_json::json!({
            "model": self.model,
            "max_tokens": 300,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "image", "source": Self::image_source(image_url) },
                        { "type": "text", "text": prompt }
                    ]
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(CaptionError::RateLimitExceeded);
            }
            return Err(CaptionError::Provider(error_text));
        }

        let response_data: serde_json::Value = response.json().await?;

        let content = response_data["content"][0]["text"]
            .as_str()
            .ok_or(CaptionError::InvalidResponse("Missing content".to_string()))?
            .trim()
            .to_string();

        Ok(content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn test_registry_default_and_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register("first", Arc::new(FixedProvider("a")));
        registry.register("second", Arc::new(FixedProvider("b")));

        let default = registry.get("").unwrap();
        assert_eq!(default.caption("", "").await.unwrap(), "a");

        registry.set_default("second");
        let default = registry.get("").unwrap();
        assert_eq!(default.caption("", "").await.unwrap(), "b");

        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_empty_registry_has_no_default() {
        let registry = ProviderRegistry::new();
        assert!(registry.get("").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_anthropic_image_source_variants() {
        let url = AnthropicCaptionProvider::image_source("https://example.com/a.png");
        assert_eq!(url["type"], "url");

        let data = AnthropicCaptionProvider::image_source("data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(data["type"], "base64");
        assert_eq!(data["media_type"], "image/jpeg");
        assert_eq!(data["data"], "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_openai_provider_parses_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"content": " a cat on a keyboard "}}]}"#,
            )
            .create_async()
            .await;

        let provider = OpenAiCaptionProvider::new("test-key".to_string(), "gpt-4o-mini".to_string())
            .with_base_url(server.url());

        let caption = provider
            .caption("describe this", "https://example.com/cat.png")
            .await
            .unwrap();

        assert_eq!(caption, "a cat on a keyboard");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_provider_maps_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let provider = OpenAiCaptionProvider::new("test-key".to_string(), "gpt-4o-mini".to_string())
            .with_base_url(server.url());

        let err = provider
            .caption("describe this", "https://example.com/cat.png")
            .await
            .unwrap_err();

        assert!(matches!(err, CaptionError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_anthropic_provider_parses_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "text", "text": "a sunset"}]}"#)
            .create_async()
            .await;

        let provider =
            AnthropicCaptionProvider::new("test-key".to_string(), "claude-3-5-haiku".to_string())
                .with_base_url(server.url());

        let caption = provider
            .caption("describe this", "https://example.com/sun.png")
            .await
            .unwrap();

        assert_eq!(caption, "a sunset");
    }
}
