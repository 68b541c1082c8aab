//! Common types shared by the assembler and the lifecycle driver.
//!
//! This module provides:
//! 1. **Address Types:** Physical address ranges and memory-size parsing.
//! 2. **Clocking:** Tick units, clock domains and voltage domains.
//! 3. **Error Handling:** The configuration/topology/engine/usage error taxonomy.

/// Address ranges and size strings.
pub mod addr;

/// Ticks, clock domains and voltage domains.
pub mod clock;

/// Error types.
pub mod error;

pub use addr::{AddrRange, parse_size};
pub use clock::{ClockDomain, TICKS_PER_SECOND, Tick, VoltageDomain};
pub use error::{ConfigError, EngineError, Result, SimError, TopologyError, UsageError};
