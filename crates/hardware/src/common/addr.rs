//! Physical address ranges and memory-size strings.
//!
//! This module provides:
//! 1. **Size parsing:** Human-readable sizes such as `"512MB"`, `"64kB"` or `"1GiB"` to bytes.
//!    Decimal-looking suffixes are binary multiples, matching how simulators size memories.
//! 2. **Address ranges:** Half-open `[start, end)` ranges with overlap and containment tests.

use std::fmt;

use serde::Serialize;

use super::error::ConfigError;

/// Parses a memory size string into a byte count.
///
/// Accepts a bare integer (bytes) or an integer followed by one of `B`, `kB`/`KB`/`KiB`,
/// `MB`/`MiB`, `GB`/`GiB`, `TB`/`TiB`. Zero is accepted here; callers decide whether an
/// empty size is meaningful.
///
/// # Arguments
///
/// * `text` - Size string, surrounding whitespace ignored.
///
/// # Returns
///
/// The size in bytes, or `ConfigError::InvalidSize` if the string is malformed or overflows.
pub fn parse_size(text: &str) -> Result<u64, ConfigError> {
    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(ConfigError::InvalidSize(text.to_string()));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| ConfigError::InvalidSize(text.to_string()))?;
    let shift = match suffix.trim() {
        "" | "B" => 0,
        "kB" | "KB" | "KiB" | "k" | "K" => 10,
        "MB" | "MiB" | "M" => 20,
        "GB" | "GiB" | "G" => 30,
        "TB" | "TiB" | "T" => 40,
        _ => return Err(ConfigError::InvalidSize(text.to_string())),
    };
    value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| ConfigError::InvalidSize(text.to_string()))
}

/// Half-open physical address range `[start, start + size)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AddrRange {
    /// First byte of the range.
    pub start: u64,
    /// Number of bytes covered.
    pub size: u64,
}

impl AddrRange {
    /// Creates a range starting at `start` spanning `size` bytes.
    pub const fn new(start: u64, size: u64) -> Self {
        Self { start, size }
    }

    /// Creates a range starting at address zero from a size string (e.g. `"512MB"`).
    ///
    /// # Returns
    ///
    /// The range, `ConfigError::InvalidSize` for malformed input, or
    /// `ConfigError::EmptyAddressRange` when the size is zero bytes.
    pub fn from_size_str(text: &str) -> Result<Self, ConfigError> {
        let size = parse_size(text)?;
        if size == 0 {
            return Err(ConfigError::EmptyAddressRange(text.to_string()));
        }
        Ok(Self::new(0, size))
    }

    /// One past the last byte of the range (saturating).
    pub const fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    /// Returns `true` if the range covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if the two ranges share at least one byte.
    pub const fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end()
            && other.start < self.end()
    }

    /// Returns `true` if `other` lies entirely inside this range.
    pub const fn contains_range(&self, other: &Self) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}:{:#x}]", self.start, self.end())
    }
}
