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

//! Flat-file context snapshot
//!
//! A single pretty-printed JSON file mapping group id to its buffered
//! messages. Written on orderly shutdown, read on startup, deleted on a
//! context reset. Individual entries that fail to decode are skipped so an
//! old or hand-edited snapshot never blocks startup.

use roomsense_core::{EnhancerResult, GroupMessage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reads and writes the flat context cache file
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    path: PathBuf,
}

impl ContextSnapshot {
    /// Create a snapshot handle for the given file path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load buffered messages, skipping entries that no longer decode.
    ///
    /// A missing file is not an error; it just means a cold start.
    pub fn load(&self) -> EnhancerResult<HashMap<String, Vec<GroupMessage>>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let raw: HashMap<String, Vec<serde_json::Value>> = serde_json::from_str(&content)?;

        let mut data = HashMap::new();
        for (group_id, entries) in raw {
            let mut messages = Vec::with_capacity(entries.len());
            for entry in entries {
                match serde_json::from_value::<GroupMessage>(entry) {
                    Ok(message) => messages.push(message),
                    Err(e) => {
                        warn!(group_id = %group_id, "skipping undecodable snapshot entry: {}", e);
                    }
                }
            }
            data.insert(group_id, messages);
        }

        info!(path = %self.path.display(), groups = data.len(), "loaded context snapshot");
        Ok(data)
    }

    /// Persist the given buffers as pretty JSON, creating parent directories
    pub fn save(&self, data: &HashMap<String, Vec<GroupMessage>>) -> EnhancerResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, content)?;
        info!(path = %self.path.display(), groups = data.len(), "saved context snapshot");
        Ok(())
    }

    /// Delete the snapshot file, if present
    pub fn remove(&self) -> EnhancerResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "removed context snapshot");
        }
        Ok(())
    }
}
