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

//! Roomsense group memory
//!
//! In-memory bookkeeping for the enrichment engine:
//! - [`GroupStore`]: per-group bounded FIFO buffers with duplicate
//!   suppression and inactive-group cleanup
//! - [`ContextSnapshot`]: a flat JSON cache file so buffered context survives
//!   an orderly restart (best-effort only; no durability guarantee)

pub mod snapshot;
pub mod store;

// Re-exports
pub use snapshot::ContextSnapshot;
pub use store::{GroupStore, StoreStats};
