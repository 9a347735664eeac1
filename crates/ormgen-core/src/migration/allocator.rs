//! Migration timestamp allocation.

use crate::error::Error;
use chrono::{Duration, NaiveDateTime, Timelike, Utc};

/// Spacing between consecutive timestamps, in seconds.
pub const QUANTUM_SECONDS: i64 = 30;

/// Encoding of an allocated timestamp (14 digits, lexicographically sortable).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Hands out strictly increasing, fixed-width timestamps.
///
/// Each call advances the cursor by [`QUANTUM_SECONDS`] before encoding it,
/// so the first timestamp is one quantum after the base instant.
#[derive(Debug, Clone)]
pub struct TimestampAllocator {
    cursor: NaiveDateTime,
}

impl TimestampAllocator {
    /// Create an allocator over a base instant (sub-second precision dropped).
    pub fn new(base: NaiveDateTime) -> Self {
        Self {
            cursor: base.with_nanosecond(0).unwrap_or(base),
        }
    }

    /// Create an allocator based at the current UTC time.
    pub fn now() -> Self {
        Self::new(Utc::now().naive_utc())
    }

    /// Create an allocator from a 14-digit `YYYYMMDDHHMMSS` base.
    pub fn from_timestamp(encoded: &str) -> Result<Self, Error> {
        let base = NaiveDateTime::parse_from_str(encoded.trim(), TIMESTAMP_FORMAT).map_err(|e| {
            Error::InvalidConfig(format!("invalid base timestamp `{}`: {}", encoded, e))
        })?;
        Ok(Self::new(base))
    }

    /// Advance by one quantum and return the encoded timestamp.
    pub fn allocate(&mut self) -> String {
        self.cursor += Duration::seconds(QUANTUM_SECONDS);
        self.cursor.format(TIMESTAMP_FORMAT).to_string()
    }

    /// The last allocated instant (or the base if nothing was allocated).
    pub fn cursor(&self) -> NaiveDateTime {
        self.cursor
    }
}

impl Iterator for TimestampAllocator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.allocate())
    }
}
