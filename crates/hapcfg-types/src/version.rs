use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Monotonic counter stamped on the whole configuration file.
///
/// Every committed transaction advances the version by exactly one. Writers
/// supply the version they read; a mismatch at commit time means someone
/// else committed in between.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version of a configuration file that has never been committed to.
    pub const INITIAL: Version = Version(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The version a successful commit on top of `self` produces, or `None`
    /// once the counter is exhausted.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A read result together with the configuration version it reflects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(rename = "_version")]
    pub version: Version,
    pub data: T,
}

impl<T> Versioned<T> {
    pub fn new(version: Version, data: T) -> Self {
        Self { version, data }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            version: self.version,
            data: f(self.data),
        }
    }
}
