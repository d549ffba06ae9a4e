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

//! Per-group message buffers
//!
//! Each group gets a bounded FIFO of [`GroupMessage`]s, created lazily on its
//! first event. The store also owns the two hygiene concerns that keep the
//! buffers honest over long uptimes: duplicate suppression for re-delivered
//! events, and eviction of groups that have gone quiet for weeks.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use roomsense_core::{GroupMessage, MessageKind};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// How many trailing messages the duplicate check inspects
const DEDUP_SCAN_DEPTH: usize = 5;
/// Two deliveries of the same text from the same sender within this window
/// are treated as one message
const DEDUP_WINDOW_SECS: i64 = 3;
/// How many trailing messages the trigger re-mark inspects
const REMARK_WINDOW: usize = 20;
/// Groups quiet for longer than this are dropped from memory
const INACTIVE_RETENTION_DAYS: i64 = 30;

/// Per-group bounded message buffers
#[derive(Debug)]
pub struct GroupStore {
    /// Maximum messages kept per group
    capacity: usize,
    /// Minimum spacing between inactive-group sweeps
    cleanup_interval: Duration,
    /// Buffers by group id
    groups: RwLock<HashMap<String, VecDeque<GroupMessage>>>,
    /// Last event time by group id
    last_activity: RwLock<HashMap<String, DateTime<Utc>>>,
    /// When the last sweep ran
    last_cleanup: RwLock<Instant>,
}

impl GroupStore {
    /// Create a store with the given per-group capacity
    pub fn new(capacity: usize, cleanup_interval: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            cleanup_interval,
            groups: RwLock::new(HashMap::new()),
            last_activity: RwLock::new(HashMap::new()),
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    /// Collect an inbound message, suppressing near-duplicate deliveries.
    ///
    /// Returns `false` when the message was dropped as a duplicate. Image
    /// messages always pass so their URLs are never silently lost.
    pub async fn collect(&self, message: GroupMessage) -> bool {
        self.touch(&message.group_id).await;
        self.maybe_sweep().await;

        let mut groups = self.groups.write().await;
        let buffer = groups
            .entry(message.group_id.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));

        if !message.has_image() && Self::is_duplicate(buffer, &message) {
            debug!(
                group_id = %message.group_id,
                sender = %message.sender_name,
                "skipping duplicate message"
            );
            return false;
        }

        Self::push_bounded(buffer, message, self.capacity);
        true
    }

    /// Append a message unconditionally (used for the bot's own replies)
    pub async fn append(&self, message: GroupMessage) {
        self.touch(&message.group_id).await;

        let mut groups = self.groups.write().await;
        let buffer = groups
            .entry(message.group_id.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        Self::push_bounded(buffer, message, self.capacity);
    }

    /// Buffered messages for a group, oldest first
    pub async fn messages(&self, group_id: &str) -> Vec<GroupMessage> {
        let groups = self.groups.read().await;
        groups
            .get(group_id)
            .map(|buffer| buffer.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a group has any buffered history
    pub async fn is_empty(&self, group_id: &str) -> bool {
        let groups = self.groups.read().await;
        groups.get(group_id).map(|b| b.is_empty()).unwrap_or(true)
    }

    /// Re-mark the message that ended up waking the LLM as [`MessageKind::Triggered`].
    ///
    /// Searches the trailing window newest-first, matching on the host message
    /// id when one is available, and otherwise on sender plus exact text. When
    /// nothing matches the buffer is left unchanged.
    pub async fn mark_triggered(
        &self,
        group_id: &str,
        message_id: Option<&str>,
        sender_id: &str,
        text: &str,
    ) -> bool {
        let mut groups = self.groups.write().await;
        let Some(buffer) = groups.get_mut(group_id) else {
            return false;
        };

        if let Some(wanted) = message_id {
            for message in buffer.iter_mut().rev().take(REMARK_WINDOW) {
                if message.id.as_deref() == Some(wanted) {
                    message.kind = MessageKind::Triggered;
                    debug!(group_id, message_id = wanted, "re-marked trigger by id");
                    return true;
                }
            }
        }

        for message in buffer.iter_mut().rev().take(REMARK_WINDOW) {
            if message.kind.is_chat() && message.sender_id == sender_id && message.text == text {
                message.kind = MessageKind::Triggered;
                debug!(group_id, sender_id, "re-marked trigger by sender and text");
                return true;
            }
        }

        warn!(
            group_id,
            "could not locate triggering message in buffer; leaving kinds unchanged"
        );
        false
    }

    /// Drop all buffered history
    pub async fn clear_all(&self) {
        self.groups.write().await.clear();
        self.last_activity.write().await.clear();
        debug!("cleared all group buffers");
    }

    /// Clone out every buffer, for snapshotting
    pub async fn export(&self) -> HashMap<String, Vec<GroupMessage>> {
        let groups = self.groups.read().await;
        groups
            .iter()
            .map(|(id, buffer)| (id.clone(), buffer.iter().cloned().collect()))
            .collect()
    }

    /// Seed buffers from a snapshot, keeping only the newest entries that fit
    pub async fn load(&self, data: HashMap<String, Vec<GroupMessage>>) {
        let now = Utc::now();
        let mut groups = self.groups.write().await;
        let mut activity = self.last_activity.write().await;

        for (group_id, messages) in data {
            let skip = messages.len().saturating_sub(self.capacity);
            let buffer: VecDeque<GroupMessage> = messages.into_iter().skip(skip).collect();
            if buffer.is_empty() {
                continue;
            }
            activity.insert(group_id.clone(), now);
            groups.insert(group_id, buffer);
        }
    }

    /// Store statistics
    pub async fn stats(&self) -> StoreStats {
        let groups = self.groups.read().await;
        StoreStats {
            group_count: groups.len(),
            message_count: groups.values().map(|b| b.len()).sum(),
        }
    }

    async fn touch(&self, group_id: &str) {
        self.last_activity
            .write()
            .await
            .insert(group_id.to_string(), Utc::now());
    }

    /// Rate-limited sweep of groups idle beyond the retention window
    async fn maybe_sweep(&self) {
        {
            let last = self.last_cleanup.read().await;
            if last.elapsed() < self.cleanup_interval {
                return;
            }
        }
        *self.last_cleanup.write().await = Instant::now();

        let threshold = Utc::now() - ChronoDuration::days(INACTIVE_RETENTION_DAYS);
        let mut activity = self.last_activity.write().await;
        let stale: Vec<String> = activity
            .iter()
            .filter(|(_, last)| **last < threshold)
            .map(|(id, _)| id.clone())
            .collect();

        if stale.is_empty() {
            return;
        }

        let mut groups = self.groups.write().await;
        for group_id in &stale {
            groups.remove(group_id);
            activity.remove(group_id);
        }
        debug!(count = stale.len(), "evicted inactive group buffers");
    }

    fn is_duplicate(buffer: &VecDeque<GroupMessage>, candidate: &GroupMessage) -> bool {
        buffer.iter().rev().take(DEDUP_SCAN_DEPTH).any(|existing| {
            existing.sender_id == candidate.sender_id
                && existing.text == candidate.text
                && (candidate.timestamp - existing.timestamp)
                    .num_seconds()
                    .abs()
                    < DEDUP_WINDOW_SECS
        })
    }

    fn push_bounded(buffer: &mut VecDeque<GroupMessage>, message: GroupMessage, capacity: usize) {
        if buffer.len() >= capacity {
            buffer.pop_front();
        }
        buffer.push_back(message);
    }
}

/// Storage statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub group_count: usize,
    pub message_count: usize,
}
