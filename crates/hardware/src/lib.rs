//! Memory-hierarchy topology assembler library.
//!
//! This crate builds the port graph of a simulated single-CPU system and drives it through
//! an external simulation engine:
//! 1. **Configuration:** Clock, memory range, per-level cache parameters and the workload.
//! 2. **SoC:** Leaf components (CPU, caches, crossbars, interrupt controller, DRAM
//!    controller) and the assembler that wires them into a validated, frozen graph.
//! 3. **Simulation:** The engine contract and the lifecycle driver that instantiates the
//!    graph, runs it to termination and reports the exit tick and cause.

/// Common types (address ranges, clock domains, errors).
pub mod common;
/// Assembler configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Workloads, engines and the lifecycle driver.
pub mod sim;
/// System-on-chip topology (leaves, port graph, assembler).
pub mod soc;

/// Root configuration type; use `Config::default()` or load it from JSON.
pub use crate::config::Config;
/// Error types returned by every fallible operation.
pub use crate::common::error::{
    ConfigError, EngineError, Result, SimError, TopologyError, UsageError,
};
/// Lifecycle driver; construct with `Simulation::new(engine, graph)`.
pub use crate::sim::Simulation;
/// Topology assembler and the one-call canonical build.
pub use crate::soc::{TopologyAssembler, build_system};
