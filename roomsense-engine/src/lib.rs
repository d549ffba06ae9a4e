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

//! Roomsense engine
//!
//! The [`Enhancer`] is the single object a host plugin owns. The host adapter
//! translates framework events into [`roomsense_core::ChatEvent`]s and calls:
//!
//! - [`Enhancer::on_message`] for every inbound chat message,
//! - [`Enhancer::on_llm_request`] just before a prompt goes to the provider,
//! - [`Enhancer::on_llm_response`] when a completion comes back,
//! - [`Enhancer::clear_context`] for the host's reset command,
//! - [`Enhancer::shutdown`] on plugin termination.
//!
//! All hooks are infallible from the host's point of view: internal failures
//! are logged and swallowed so enrichment can never break message dispatch.
//!
//! # Example
//!
//! ```rust,ignore
//! use roomsense_caption::ProviderRegistry;
//! use roomsense_core::{ChatEvent, EnhancerConfig, ProviderRequest};
//! use roomsense_engine::Enhancer;
//!
//! # async fn run() {
//! let enhancer = Enhancer::new(EnhancerConfig::default(), ProviderRegistry::new()).await;
//!
//! let event = ChatEvent::group("g1", "u1", "alice").text("anyone around?");
//! enhancer.on_message(&event).await;
//!
//! let trigger = ChatEvent::group("g1", "u2", "bob").text("@bot summarize").wake();
//! enhancer.on_message(&trigger).await;
//!
//! let mut request = ProviderRequest::new("@bot summarize");
//! enhancer.on_llm_request(&trigger, &mut request).await;
//! // request.prompt now carries the recent room history.
//! # }
//! ```

pub mod engine;

// Re-exports
pub use engine::Enhancer;
