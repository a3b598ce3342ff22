use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Per-identity duplicate-match suppression.
///
/// Maps identity id to the instant of its last accepted match. The check
/// and the timestamp update are one atomic step per key: the map entry's
/// shard lock is held across both, so two concurrent accepts for the same
/// identity inside one window can never both pass. Distinct identities do
/// not serialize against each other.
///
/// Entries are never evicted; the map grows with the number of distinct
/// identities ever accepted, bounded by the gallery size.
pub struct CooldownTracker {
    window: Duration,
    last_accepted: DashMap<String, Instant>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true and records `now` as the identity's last accepted time
    /// if no prior record exists or at least the window has elapsed since
    /// the previous accepted match. Suppressed calls leave the recorded
    /// time untouched: the window is measured from the last *accepted*
    /// match, not from every attempt.
    pub fn should_accept(&self, identity_id: &str, now: Instant) -> bool {
        use dashmap::mapref::entry::Entry;

        match self.last_accepted.entry(identity_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) >= self.window {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Last accepted instant for an identity, if it ever matched.
    pub fn last_accepted(&self, identity_id: &str) -> Option<Instant> {
        self.last_accepted.get(identity_id).map(|e| *e.value())
    }

    /// Number of identities ever accepted.
    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_empty()
    }
}
