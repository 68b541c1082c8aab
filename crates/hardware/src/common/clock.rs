//! Clock and voltage domains.
//!
//! Simulated time is measured in integer ticks of one picosecond. This module converts
//! configuration strings such as `"1GHz"`, `"2.5GHz"`, `"500ps"` or `"0.9V"` into the
//! domain parameters the system root carries.

use serde::Serialize;

use super::error::ConfigError;

/// Simulated time in ticks.
pub type Tick = u64;

/// Number of ticks in one simulated second (1 tick = 1 ps).
pub const TICKS_PER_SECOND: Tick = 1_000_000_000_000;

fn split_number(text: &str) -> (&str, &str) {
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
        .unwrap_or(text.len());
    text.split_at(split)
}

/// A clock domain: the frequency every component in it is driven at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClockDomain {
    /// The configured string, kept for the config dump.
    pub clock: String,
    /// Frequency in hertz.
    pub frequency_hz: f64,
    /// Clock period in ticks.
    pub period: Tick,
}

impl ClockDomain {
    /// Parses a clock given either as a frequency (`"1GHz"`) or a period (`"1ns"`).
    ///
    /// # Returns
    ///
    /// The domain, `ConfigError::NonPositiveClock` for zero or negative values, or
    /// `ConfigError::InvalidFrequency` for anything that does not parse or is finer than a tick.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let trimmed = text.trim();
        let (number, unit) = split_number(trimmed);
        let value: f64 = number
            .parse()
            .map_err(|_| ConfigError::InvalidFrequency(text.to_string()))?;
        if !value.is_finite() {
            return Err(ConfigError::InvalidFrequency(text.to_string()));
        }
        if value <= 0.0 {
            return Err(ConfigError::NonPositiveClock(text.to_string()));
        }

        let frequency_hz = match unit {
            "Hz" => value,
            "kHz" => value * 1e3,
            "MHz" => value * 1e6,
            "GHz" => value * 1e9,
            "THz" => value * 1e12,
            "s" => 1.0 / value,
            "ms" => 1.0 / (value * 1e-3),
            "us" => 1.0 / (value * 1e-6),
            "ns" => 1.0 / (value * 1e-9),
            "ps" => 1.0 / (value * 1e-12),
            _ => return Err(ConfigError::InvalidFrequency(text.to_string())),
        };

        let period = (TICKS_PER_SECOND as f64 / frequency_hz).round() as Tick;
        if period == 0 {
            return Err(ConfigError::InvalidFrequency(text.to_string()));
        }

        Ok(Self {
            clock: trimmed.to_string(),
            frequency_hz,
            period,
        })
    }
}

/// A voltage domain shared by a clock domain.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoltageDomain {
    /// The configured string, kept for the config dump.
    pub voltage: String,
    /// Supply voltage in volts.
    pub volts: f64,
}

impl VoltageDomain {
    /// Parses a voltage such as `"1V"`, `"0.9V"` or `"900mV"`.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let trimmed = text.trim();
        let (number, unit) = split_number(trimmed);
        let value: f64 = number
            .parse()
            .map_err(|_| ConfigError::InvalidVoltage(text.to_string()))?;
        let volts = match unit {
            "V" | "" => value,
            "mV" => value * 1e-3,
            _ => return Err(ConfigError::InvalidVoltage(text.to_string())),
        };
        if !volts.is_finite() {
            return Err(ConfigError::InvalidVoltage(text.to_string()));
        }
        if volts <= 0.0 {
            return Err(ConfigError::NonPositiveVoltage(text.to_string()));
        }
        Ok(Self {
            voltage: trimmed.to_string(),
            volts,
        })
    }
}
