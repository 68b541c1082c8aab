//! Hierarchy tiers.
//!
//! Tiers are totally ordered: `L1 < L2 < ... < Memory`. A cache sits at the tier of its
//! level; a crossbar sits at the tier of the caches (or controller) on its memory side.

use std::fmt;

use serde::Serialize;

/// Position in the memory hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Cache level `n`, starting at 1.
    Cache(u8),
    /// Main memory, below every cache level.
    Memory,
}

impl Tier {
    /// First-level caches.
    pub const L1: Self = Self::Cache(1);
    /// Second-level cache.
    pub const L2: Self = Self::Cache(2);
    /// Third-level cache.
    pub const L3: Self = Self::Cache(3);

    /// Cache level number, or `None` for main memory.
    pub const fn level(self) -> Option<u8> {
        match self {
            Self::Cache(n) => Some(n),
            Self::Memory => None,
        }
    }

    /// The tier directly below this one when `depth` cache levels exist.
    ///
    /// The last cache level is followed by main memory.
    pub const fn next(self, depth: u8) -> Self {
        match self {
            Self::Cache(n) if n < depth => Self::Cache(n + 1),
            _ => Self::Memory,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache(n) => write!(f, "L{n}"),
            Self::Memory => f.write_str("memory"),
        }
    }
}
