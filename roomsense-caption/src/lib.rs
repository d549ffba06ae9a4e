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

//! Image captioning for Roomsense
//!
//! Turns image attachments into short text descriptions by calling a vision
//! LLM through the [`CaptionProvider`] seam. Captioning is strictly optional:
//! every failure path (no provider, HTTP error, timeout) degrades to `None`
//! and callers substitute a placeholder.
//!
//! Results are memoized in a content-hash keyed [`CaptionCache`] with bounded
//! size and FIFO eviction, so re-posted stickers and forwarded images do not
//! trigger repeat provider calls.

pub mod cache;
pub mod captioner;
pub mod provider;

// Re-exports
pub use cache::{CacheStats, CaptionCache};
pub use captioner::{CaptionSettings, ImageCaptioner};
pub use provider::{
    AnthropicCaptionProvider, CaptionError, CaptionProvider, OpenAiCaptionProvider,
    ProviderRegistry,
};
