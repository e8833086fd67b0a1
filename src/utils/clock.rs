//! Deterministic clock helpers for tests and time-sensitive diagnostics.
//!
//! Real execution always goes through `chrono::Utc::now()` (see
//! [`crate::channels::errors::ErrorEvent`] and checkpoint timestamps); this
//! module exists for code that needs a clock it can advance by hand.

use std::time::Duration;

/// A manually-advanced clock, in whole seconds since an arbitrary epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockClock {
    current: u64,
}

impl MockClock {
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self { current: start }
    }

    #[must_use]
    pub fn now(&self) -> u64 {
        self.current
    }

    pub fn advance_secs(&mut self, secs: u64) {
        self.current = self.current.saturating_add(secs);
    }

    #[must_use]
    pub fn has_elapsed(&self, since: u64, duration: Duration) -> bool {
        self.current.saturating_sub(since) >= duration.as_secs()
    }
}

/// Timestamp formatting shared by event sinks and checkpoint metadata.
pub mod time_utils {
    use chrono::{DateTime, Utc};

    /// Formats a unix timestamp (seconds) as an RFC 3339 string.
    ///
    /// Falls back to a fixed placeholder for out-of-range inputs rather
    /// than panicking — formatting is diagnostic-only and must never be
    /// the cause of a failed run.
    #[must_use]
    pub fn format_timestamp(unix_secs: i64) -> String {
        DateTime::<Utc>::from_timestamp(unix_secs, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "invalid-timestamp".to_string())
    }
}
