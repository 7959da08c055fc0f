//! Per-tag bookkeeping of visible notifications
//!
//! Each tag maps to the server id of its latest notification, so a later
//! show with the same tag replaces it in place and a close reaches the
//! server. Entries leave the registry when the notification is closed,
//! and the oldest entry is evicted once `capacity` tags are tracked.

use std::collections::HashMap;

use crate::domain::relay::SafeData;

/// Number of tags tracked before the oldest is evicted
pub const MAX_TRACKED: usize = 64;

/// Something that can take a notification off the screen
pub trait Dismiss {
    fn dismiss(self);
}

impl Dismiss for () {
    fn dismiss(self) {}
}

#[derive(Debug)]
struct Entry<H> {
    id: u32,
    handle: H,
    data: SafeData,
    waiting: bool,
    seq: u64,
}

/// Latest notification per tag
#[derive(Debug)]
pub struct TagRegistry<H> {
    entries: HashMap<String, Entry<H>>,
    capacity: usize,
    next_seq: u64,
}

impl<H> TagRegistry<H> {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TRACKED)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    /// Server id to replace when showing `tag`
    pub fn id(&self, tag: &str) -> Option<u32> {
        self.entries.get(tag).map(|e| e.id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record the notification shown for `tag`.
    ///
    /// Returns true when the caller should start a waiter for `id`: `watch`
    /// is set and no waiter is already listening for that id.
    pub fn record(&mut self, tag: &str, id: u32, data: SafeData, handle: H, watch: bool) -> bool {
        let already_waiting = matches!(self.entries.get(tag), Some(e) if e.id == id && e.waiting);
        let start = watch && !already_waiting;

        if !self.entries.contains_key(tag) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.next_seq += 1;
        self.entries.insert(
            tag.to_string(),
            Entry {
                id,
                handle,
                data,
                waiting: already_waiting || start,
                seq: self.next_seq,
            },
        );
        start
    }

    /// Remove `tag`, returning its server id and handle
    pub fn take(&mut self, tag: &str) -> Option<(u32, H)> {
        self.entries.remove(tag).map(|e| (e.id, e.handle))
    }

    /// Forget `tag` after the server closed notification `id`.
    ///
    /// A newer notification under the same tag is kept.
    pub fn closed(&mut self, tag: &str, id: u32) -> bool {
        if self.id(tag) == Some(id) {
            self.entries.remove(tag);
            true
        } else {
            false
        }
    }

    /// Data of the latest notification when `id` is still current for `tag`
    pub fn clicked(&self, tag: &str, id: u32) -> Option<SafeData> {
        self.entries
            .get(tag)
            .filter(|e| e.id == id)
            .map(|e| e.data.clone())
    }

    /// The waiter for `id` has returned
    pub fn waiter_done(&mut self, tag: &str, id: u32) {
        if let Some(entry) = self.entries.get_mut(tag).filter(|e| e.id == id) {
            entry.waiting = false;
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.seq)
            .map(|(tag, _)| tag.clone());
        if let Some(tag) = oldest {
            tracing::debug!(tag = %tag, "evicting oldest tracked notification");
            self.entries.remove(&tag);
        }
    }
}

impl<H> Default for TagRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(value: &str) -> SafeData {
        [("appointment_id", value)].into_iter().collect()
    }

    #[test]
    fn replacement_keeps_single_waiter() {
        let mut tags = TagRegistry::new();

        assert!(tags.record("incoming-call", 7, data("41"), (), true));
        assert!(!tags.record("incoming-call", 7, data("42"), (), true));

        assert_eq!(tags.len(), 1);
        assert_eq!(tags.clicked("incoming-call", 7), Some(data("42")));
    }

    #[test]
    fn new_waiter_after_previous_returned() {
        let mut tags = TagRegistry::new();
        assert!(tags.record("incoming-call", 7, data("41"), (), true));

        tags.waiter_done("incoming-call", 7);
        assert!(tags.record("incoming-call", 7, data("41"), (), true));
    }

    #[test]
    fn new_server_id_gets_own_waiter() {
        let mut tags = TagRegistry::new();
        assert!(tags.record("incoming-call", 7, data("41"), (), true));
        assert!(tags.record("incoming-call", 9, data("41"), (), true));
        assert_eq!(tags.id("incoming-call"), Some(9));
    }

    #[test]
    fn unwatched_record_starts_nothing() {
        let mut tags = TagRegistry::new();
        assert!(!tags.record("incoming-call", 7, data("41"), (), false));
        assert!(tags.record("incoming-call", 7, data("41"), (), true));
    }

    #[test]
    fn stale_close_keeps_newer_notification() {
        let mut tags = TagRegistry::new();
        tags.record("incoming-call", 7, data("41"), (), true);
        tags.record("incoming-call", 9, data("42"), (), true);

        assert!(!tags.closed("incoming-call", 7));
        assert_eq!(tags.id("incoming-call"), Some(9));
        assert_eq!(tags.clicked("incoming-call", 7), None);

        assert!(tags.closed("incoming-call", 9));
        assert!(tags.is_empty());
    }

    #[test]
    fn oldest_tag_is_evicted_at_capacity() {
        let mut tags = TagRegistry::with_capacity(2);
        tags.record("call-1", 1, data("1"), (), false);
        tags.record("call-2", 2, data("2"), (), false);
        tags.record("call-1", 1, data("1"), (), false);
        tags.record("call-3", 3, data("3"), (), false);

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.id("call-2"), None);
        assert_eq!(tags.id("call-1"), Some(1));
        assert_eq!(tags.id("call-3"), Some(3));
    }

    #[test]
    fn take_returns_handle() {
        let mut tags = TagRegistry::new();
        tags.record("incoming-call", 7, data("41"), "handle-7", false);

        assert_eq!(tags.take("incoming-call"), Some((7, "handle-7")));
        assert_eq!(tags.take("incoming-call"), None);
    }
}
