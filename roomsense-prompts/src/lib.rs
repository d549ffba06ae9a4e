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

//! Roomsense prompt assembly
//!
//! Takes a group's buffered history and the outgoing prompt, and produces the
//! enriched prompt text: a fixed header, recent chatter, the bot's own recent
//! replies, a situation line naming the sender, and a closing instruction.
//! The header doubles as the idempotence guard so a prompt is never enhanced
//! twice.

pub mod builder;
pub mod extract;

// Re-exports
pub use builder::{PromptBuilder, PromptTemplates, Situation};
pub use extract::{extract_history, ExtractLimits, HistoryExtract};
