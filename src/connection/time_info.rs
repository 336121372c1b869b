//! Time spent by a connection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::time::Duration;

/// Time information of a connection's history of usage.
///
/// All durations are zero for a freshly established connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionTimeInfo {
    /// Time spent encoding messages to a stream of words since construction.
    pub encode_duration: Duration,

    /// Time spent decoding messages from a stream of words since construction.
    pub decode_duration: Duration,

    /// Time spent sending streams of words to the backend since construction.
    pub commit_duration: Duration,

    /// Time spent waiting for end of execution on the backend.
    ///
    /// For hardware execution this includes the commit time.
    pub execution_duration: Duration,
}

impl AddAssign for ConnectionTimeInfo {
    fn add_assign(&mut self, other: Self) {
        self.encode_duration += other.encode_duration;
        self.decode_duration += other.decode_duration;
        self.commit_duration += other.commit_duration;
        self.execution_duration += other.execution_duration;
    }
}

impl Add for ConnectionTimeInfo {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

// Durations cannot go negative; differences clamp at zero.
impl SubAssign for ConnectionTimeInfo {
    fn sub_assign(&mut self, other: Self) {
        self.encode_duration = self.encode_duration.saturating_sub(other.encode_duration);
        self.decode_duration = self.decode_duration.saturating_sub(other.decode_duration);
        self.commit_duration = self.commit_duration.saturating_sub(other.commit_duration);
        self.execution_duration = self
            .execution_duration
            .saturating_sub(other.execution_duration);
    }
}

impl Sub for ConnectionTimeInfo {
    type Output = Self;

    fn sub(mut self, other: Self) -> Self {
        self -= other;
        self
    }
}

impl fmt::Display for ConnectionTimeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ConnectionTimeInfo(")?;
        writeln!(f, "\tencode_duration:    {:?}", self.encode_duration)?;
        writeln!(f, "\tdecode_duration:    {:?}", self.decode_duration)?;
        writeln!(f, "\tcommit_duration:    {:?}", self.commit_duration)?;
        writeln!(f, "\texecution_duration: {:?}", self.execution_duration)?;
        write!(f, ")")
    }
}
