//! A single cached value and its expiration bookkeeping.

use std::time::{Duration, Instant};

use super::config::ExpirationPolicy;

/// Where an entry sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    /// Not accessed within the sliding window.
    StaleBySliding,
    /// Past the deadline fixed at insertion, however often it was read.
    StaleByAbsolute,
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    last_access: Instant,
    sliding: Duration,
    /// `None` when the deadline lies beyond what `Instant` can represent.
    absolute_deadline: Option<Instant>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, policy: ExpirationPolicy, now: Instant) -> Self {
        Self {
            value,
            inserted_at: now,
            last_access: now,
            sliding: policy.sliding(),
            absolute_deadline: now.checked_add(policy.absolute()),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    pub fn state_at(&self, now: Instant) -> EntryState {
        let past = |deadline: Option<Instant>| deadline.is_some_and(|deadline| now >= deadline);

        if past(self.absolute_deadline) {
            EntryState::StaleByAbsolute
        } else if past(self.last_access.checked_add(self.sliding)) {
            EntryState::StaleBySliding
        } else {
            EntryState::Fresh
        }
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.state_at(now) == EntryState::Fresh
    }

    /// Restart the sliding window. The absolute deadline never moves.
    pub fn touch(&mut self, now: Instant) {
        if now > self.last_access {
            self.last_access = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ExpirationPolicy {
        ExpirationPolicy::from_minutes(10, 30)
    }

    #[test]
    fn fresh_until_sliding_window_elapses() {
        let start = Instant::now();
        let entry = CacheEntry::new(1u8, policy(), start);

        assert_eq!(entry.state_at(start), EntryState::Fresh);
        assert!(entry.is_valid_at(start + Duration::from_secs(599)));
        assert_eq!(
            entry.state_at(start + Duration::from_secs(600)),
            EntryState::StaleBySliding
        );
    }

    #[test]
    fn touching_extends_sliding_but_not_absolute() {
        let start = Instant::now();
        let mut entry = CacheEntry::new("v", policy(), start);

        let mut now = start;
        for _ in 0..3 {
            now += Duration::from_secs(9 * 60);
            assert!(entry.is_valid_at(now));
            entry.touch(now);
        }
        // 27 minutes in, still fresh.
        assert!(entry.is_valid_at(now + Duration::from_secs(60)));
        assert_eq!(
            entry.state_at(start + Duration::from_secs(30 * 60)),
            EntryState::StaleByAbsolute
        );
        assert_eq!(entry.inserted_at(), start);
    }

    #[test]
    fn unrepresentable_deadlines_never_expire() {
        let start = Instant::now();
        let endless = ExpirationPolicy::new(Duration::MAX, Duration::MAX);
        let entry = CacheEntry::new("v", endless, start);

        assert!(entry.is_valid_at(start + Duration::from_secs(365 * 24 * 60 * 60)));

        // A finite sliding window still applies.
        let entry = CacheEntry::new(
            "v",
            ExpirationPolicy::new(Duration::from_secs(60), Duration::MAX),
            start,
        );
        assert_eq!(
            entry.state_at(start + Duration::from_secs(60)),
            EntryState::StaleBySliding
        );
    }

    #[test]
    fn touch_never_moves_backwards() {
        let start = Instant::now();
        let mut entry = CacheEntry::new(0, policy(), start + Duration::from_secs(5));
        entry.touch(start);
        assert!(entry.is_valid_at(start + Duration::from_secs(5 + 599)));
    }
}
