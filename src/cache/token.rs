use std::time::Duration;
use tokio::time::Instant;

/// Lifetime policy of a stored entry.
///
/// Converted from signed seconds the way callers usually express it:
/// a negative value never expires, `0` is eligible for the next sweep
/// right away, a positive value lives that many seconds past the last
/// insert or refresh. A positive value too large to form a deadline
/// behaves like `Never`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    Never,
    After(Duration),
}

impl Ttl {
    pub fn from_secs(seconds: i64) -> Self {
        if seconds < 0 {
            Ttl::Never
        } else {
            Ttl::After(Duration::from_secs(seconds as u64))
        }
    }

    /// Signed seconds, `-1` for entries that never expire.
    pub fn as_secs(&self) -> i64 {
        match self {
            Ttl::Never => -1,
            Ttl::After(d) => d.as_secs() as i64,
        }
    }

    /// Deadline for an entry touched at `now`, `None` when it never comes.
    pub fn deadline_from(&self, now: Instant) -> Option<Instant> {
        match self {
            Ttl::Never => None,
            Ttl::After(d) => now.checked_add(*d),
        }
    }
}

impl From<i64> for Ttl {
    fn from(seconds: i64) -> Self {
        Ttl::from_secs(seconds)
    }
}

impl From<i32> for Ttl {
    fn from(seconds: i32) -> Self {
        Ttl::from_secs(seconds as i64)
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl::After(d)
    }
}

/// Stored value plus its expiration metadata
#[derive(Debug, Clone)]
pub struct Entry<V> {
    pub value: V,
    pub ttl: Ttl,
    /// `None` for entries that never expire
    pub expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    pub fn new(value: V, ttl: Ttl, now: Instant) -> Self {
        Self {
            value,
            ttl,
            expires_at: ttl.deadline_from(now),
        }
    }

    /// Check if entry is past its deadline
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Push the deadline to `now + ttl`. The deadline never moves earlier.
    pub fn refresh(&mut self, now: Instant) {
        if let Some(next) = self.ttl.deadline_from(now) {
            self.expires_at = Some(self.expires_at.map_or(next, |at| at.max(next)));
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// Read-only view of an entry's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub ttl: Ttl,
    /// `None` when the entry never expires
    pub remaining: Option<Duration>,
}
