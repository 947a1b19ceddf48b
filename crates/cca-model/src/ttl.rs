//! Profile time-to-live
//!
//! Two TTL computations coexist. The profile-oriented record adds one
//! calendar year; the doctrine record adds a 365-day constant. They agree
//! except across leap days, so both are kept.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Days in the doctrine record's constant TTL
pub const DOCTRINE_TTL_DAYS: i64 = 365;

/// Months in the calendar TTL
pub const CALENDAR_TTL_MONTHS: u32 = 12;

/// How `expires_at` is derived from `last_verified_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TtlPolicy {
    /// Add twelve calendar months
    ///
    /// Feb 29 rolls to Feb 28 of the following year (day clamped to the
    /// last day of the target month).
    #[default]
    CalendarYear,
    /// Add a fixed number of days
    FixedDays {
        /// Day count
        days: i64,
    },
}

impl TtlPolicy {
    /// The doctrine record's 365-day policy
    #[must_use]
    pub const fn doctrine() -> Self {
        TtlPolicy::FixedDays {
            days: DOCTRINE_TTL_DAYS,
        }
    }

    /// Expiry for a verification instant
    #[must_use]
    pub fn expires_at(self, verified_at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TtlPolicy::CalendarYear => verified_at
                .checked_add_months(Months::new(CALENDAR_TTL_MONTHS))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            TtlPolicy::FixedDays { days } => verified_at
                .checked_add_signed(Duration::days(days))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// True when the policy yields a positive TTL
    #[must_use]
    pub fn is_positive(self) -> bool {
        match self {
            TtlPolicy::CalendarYear => true,
            TtlPolicy::FixedDays { days } => days > 0,
        }
    }
}

/// Expired once `now` is strictly past `expires_at`
#[inline]
#[must_use]
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at
}
