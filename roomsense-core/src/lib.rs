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

//! Roomsense core types
//!
//! Framework-decoupled domain model for the context-enrichment engine:
//! - **Events**: the host-boundary view of an inbound chat message and of the
//!   outgoing LLM request/response
//! - **Messages**: the `GroupMessage` record buffered per group
//! - **Classification**: deciding whether a message is normal chatter, an
//!   LLM trigger, an image post, or the bot's own reply
//! - **Configuration**: the schema-declared config object supplied by the host
//!
//! The host framework's plugin registration and event dispatch stay outside
//! this workspace; everything here is plain data plus pure logic so it can be
//! driven from whatever adapter the host provides.

pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod message;

// Re-exports
pub use classify::MessageClassifier;
pub use config::EnhancerConfig;
pub use error::{EnhancerError, EnhancerResult};
pub use event::{ChatEvent, ProviderRequest, ProviderResponse, Segment};
pub use message::{GroupMessage, MessageKind};
