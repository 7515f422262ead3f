//! Expiry ordering for live sessions.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Key into the ordered index: expiry time, then insertion sequence.
type ExpiryKey = (Instant, u64);

/// Index of session expiry times, ordered by expiry.
///
/// Ties on the expiry instant are broken by insertion order. Finding the
/// expired prefix costs `O(matches + log n)`, so a sweep scales with the
/// number of evictions rather than the number of live sessions.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    /// Session IDs ordered by (expiry, sequence).
    by_expiry: BTreeMap<ExpiryKey, String>,

    /// Reverse lookup so removal by ID does not scan.
    by_id: HashMap<String, ExpiryKey>,

    /// Next insertion sequence number.
    next_seq: u64,
}

impl ExpiryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session's expiry time.
    ///
    /// If the session is already tracked, its previous entry is replaced and
    /// it moves to the back of any tie on the new instant.
    pub fn insert(&mut self, session_id: &str, expires_at: Instant) {
        self.remove(session_id);

        let key = (expires_at, self.next_seq);
        self.next_seq += 1;

        self.by_expiry.insert(key, session_id.to_string());
        self.by_id.insert(session_id.to_string(), key);
    }

    /// Stop tracking a session. Returns its expiry time if it was tracked.
    pub fn remove(&mut self, session_id: &str) -> Option<Instant> {
        let key = self.by_id.remove(session_id)?;
        self.by_expiry.remove(&key);
        Some(key.0)
    }

    /// Expiry time of a tracked session.
    pub fn expires_at(&self, session_id: &str) -> Option<Instant> {
        self.by_id.get(session_id).map(|(at, _)| *at)
    }

    /// Whether a session is tracked.
    pub fn contains(&self, session_id: &str) -> bool {
        self.by_id.contains_key(session_id)
    }

    /// IDs of every session with `expires_at <= now`, soonest first.
    pub fn expired_before(&self, now: Instant) -> Vec<String> {
        self.by_expiry
            .range(..=(now, u64::MAX))
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Remove up to `limit` expired entries and return their IDs, soonest first.
    pub fn drain_expired(&mut self, now: Instant, limit: usize) -> Vec<String> {
        let mut expired = Vec::new();

        while expired.len() < limit {
            let Some(entry) = self.by_expiry.first_entry() else {
                break;
            };
            if entry.key().0 > now {
                break;
            }
            let id = entry.remove();
            self.by_id.remove(&id);
            expired.push(id);
        }

        expired
    }

    /// Earliest expiry time in the index.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.by_expiry.keys().next().map(|(at, _)| *at)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.by_expiry.clear();
        self.by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_expired_before_returns_soonest_first() {
        let base = Instant::now();
        let mut index = ExpiryIndex::new();
        index.insert("late", base + Duration::from_secs(30));
        index.insert("early", base + Duration::from_secs(10));
        index.insert("middle", base + Duration::from_secs(20));
        index.insert("future", base + Duration::from_secs(60));

        let expired = index.expired_before(base + Duration::from_secs(30));
        assert_eq!(expired, vec!["early", "middle", "late"]);
        // Query does not mutate
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let at = Instant::now() + Duration::from_secs(5);
        let mut index = ExpiryIndex::new();
        index.insert("session-1", at);

        assert!(index.expired_before(at - Duration::from_nanos(1)).is_empty());
        assert_eq!(index.expired_before(at), vec!["session-1"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let at = Instant::now();
        let mut index = ExpiryIndex::new();
        index.insert("b", at);
        index.insert("a", at);
        index.insert("c", at);

        assert_eq!(index.drain_expired(at, usize::MAX), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let base = Instant::now();
        let mut index = ExpiryIndex::new();
        index.insert("session-1", base);
        index.insert("session-1", base + Duration::from_secs(60));

        assert_eq!(index.len(), 1);
        assert!(index.expired_before(base).is_empty());
        assert_eq!(
            index.expires_at("session-1"),
            Some(base + Duration::from_secs(60))
        );
    }

    #[test]
    fn test_drain_expired_respects_limit() {
        let base = Instant::now();
        let mut index = ExpiryIndex::new();
        for i in 0..5 {
            index.insert(&format!("session-{}", i), base);
        }
        index.insert("alive", base + Duration::from_secs(60));

        let first = index.drain_expired(base, 3);
        assert_eq!(first, vec!["session-0", "session-1", "session-2"]);
        let rest = index.drain_expired(base, 3);
        assert_eq!(rest, vec!["session-3", "session-4"]);
        assert!(index.drain_expired(base, 3).is_empty());

        assert_eq!(index.len(), 1);
        assert!(index.contains("alive"));
    }

    #[test]
    fn test_remove() {
        let at = Instant::now();
        let mut index = ExpiryIndex::new();
        index.insert("session-1", at);
        index.insert("session-2", at);

        assert_eq!(index.remove("session-1"), Some(at));
        assert_eq!(index.remove("session-1"), None);
        assert_eq!(index.len(), 1);
        assert_eq!(index.drain_expired(at, usize::MAX), vec!["session-2"]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_next_expiry() {
        let base = Instant::now();
        let mut index = ExpiryIndex::new();
        assert_eq!(index.next_expiry(), None);

        index.insert("b", base + Duration::from_secs(2));
        index.insert("a", base + Duration::from_secs(1));
        assert_eq!(index.next_expiry(), Some(base + Duration::from_secs(1)));

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.next_expiry(), None);
    }
}
