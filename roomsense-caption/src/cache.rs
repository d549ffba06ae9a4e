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

//! Bounded caption cache
//!
//! Keyed by a blake3 hash of the image payload (URL or data URL), so the same
//! image re-posted under the same reference never costs a second provider
//! call. Eviction is strict FIFO on insertion order.

use std::collections::{HashMap, VecDeque};

/// Compute the cache key for an image payload
pub fn content_hash(image_url: &str) -> String {
    let hash = blake3::hash(image_url.as_bytes());
    hex::encode(&hash.as_bytes()[..16])
}

/// Bounded FIFO cache of image captions
#[derive(Debug)]
pub struct CaptionCache {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl CaptionCache {
    /// Create a cache holding at most `capacity` captions
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a caption by key
    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(caption) => {
                self.hits += 1;
                Some(caption.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert a caption, evicting the oldest entry when full
    pub fn insert(&mut self, key: String, caption: String) {
        if self.entries.insert(key.clone(), caption).is_some() {
            // Refreshing an existing key keeps its original eviction slot.
            return;
        }

        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Number of cached captions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Hit/miss statistics
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
            entry_count: self.entries.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entry_count: usize,
}
