// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock abstraction so date-dependent flows can be tested.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Source of the current tenant-local time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Tenant-local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Real time shifted to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Builds a clock for `utc_offset_minutes` (e.g. -180 for UTC-3).
    ///
    /// Offsets outside +/-24h fall back to UTC.
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or(Utc.fix());
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.offset.from_utc_datetime(&Utc::now().naive_utc())
    }
}

/// A clock frozen at a given instant, advanced manually.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Parses an RFC 3339 timestamp such as `2025-06-02T09:00:00-03:00`.
    pub fn at(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self::new)
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
