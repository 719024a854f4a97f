//! Counter record and formatted identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CounterKey, SequenceClass};

/// Minimum digit count of the numeric part of a formatted identifier.
pub const SEQ_WIDTH: usize = 6;

/// Persistent state of one counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Counter key.
    pub key: CounterKey,

    /// Number of identifiers issued so far.
    pub seq: u64,

    /// Last committed increment (milliseconds since epoch).
    pub updated_at: i64,
}

impl CounterRecord {
    /// A record that has not issued anything yet.
    #[must_use]
    pub fn new(key: CounterKey) -> Self {
        Self {
            key,
            seq: 0,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Advance the counter by one and return the new value.
    ///
    /// Returns `None` if the counter cannot grow any further.
    pub fn advance(&mut self) -> Option<u64> {
        self.seq = self.seq.checked_add(1)?;
        self.updated_at = chrono::Utc::now().timestamp_millis();
        Some(self.seq)
    }
}

/// Human-readable identifier such as `SAL-000042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormattedId {
    prefix: &'static str,
    seq: u64,
}

impl FormattedId {
    /// Format a committed sequence value for a class.
    #[must_use]
    pub fn new(class: &SequenceClass, seq: u64) -> Self {
        Self {
            prefix: class.prefix(),
            seq,
        }
    }

    /// Class prefix part.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Numeric part.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for FormattedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:0width$}", self.prefix, self.seq, width = SEQ_WIDTH)
    }
}

impl Serialize for FormattedId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
