//! Leaf component contract.
//!
//! This module defines the `Leaf` trait implemented by every pre-built component the
//! assembler can place in the system graph. It provides:
//! 1. **Identification:** `kind` and, for hierarchy members, `tier`.
//! 2. **Ports:** The fixed, typed port set the component exposes.
//! 3. **Workload slots:** Hardware thread contexts (CPUs only).
//! 4. **Parameters:** An opaque parameter record forwarded to the engine untouched.
//!
//! The assembler depends only on this contract, never on timing parameters.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::level::Tier;
use super::port::PortSpec;

/// Kind of a component in the system graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// The system root; owns the functional system port.
    System,
    /// A CPU core.
    Cpu,
    /// A cache at some hierarchy level.
    Cache,
    /// A crossbar interconnect.
    Crossbar,
    /// A per-thread interrupt controller owned by a CPU.
    InterruptController,
    /// A DRAM memory controller.
    MemCtrl,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::Cpu => "cpu",
            Self::Cache => "cache",
            Self::Crossbar => "crossbar",
            Self::InterruptController => "interrupt controller",
            Self::MemCtrl => "memory controller",
        };
        f.write_str(name)
    }
}

/// Contract every leaf component satisfies.
pub trait Leaf {
    /// Component kind.
    fn kind(&self) -> ComponentKind;

    /// Ports exposed by this component, in declaration order.
    fn ports(&self) -> &'static [PortSpec];

    /// Hierarchy tier for caches, crossbars and memory controllers.
    fn tier(&self) -> Option<Tier> {
        None
    }

    /// Number of hardware thread contexts a workload can occupy (CPUs only).
    fn workload_slots(&self) -> usize {
        0
    }

    /// Opaque parameters forwarded to the engine (simulator object type, sizes, latencies).
    fn params(&self) -> Value;
}
