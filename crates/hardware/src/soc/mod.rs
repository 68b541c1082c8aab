//! System-on-Chip (SoC) topology.
//!
//! This module organizes the leaf components that make up the simulated system, the
//! port graph they are wired into, and the assembler that builds and freezes it.

/// Topology assembler and canonical system build.
pub mod builder;

/// Cache leaf (L1 instruction/data and shared levels).
pub mod cache;

/// CPU leaf.
pub mod cpu;

/// Interrupt controller leaf.
pub mod devices;

/// Port graph arena and finalized graph.
pub mod graph;

/// Crossbar interconnect leaf.
pub mod interconnect;

/// Hierarchy tiers.
pub mod level;

/// DRAM memory controller leaf.
pub mod memory;

/// Port model.
pub mod port;

/// Leaf component contract.
pub mod traits;

pub use builder::{SystemHandles, TopologyAssembler, build_system};
pub use graph::{ComponentId, FinalizedGraph, SystemGraph};
pub use level::Tier;
pub use port::{PortId, PortRole};
