//! # Unit Tests
//!
//! Fine-grained tests for each part of the assembler, plus the end-to-end scenarios.


/// Port graph construction and finalization checks.
pub mod graph;


/// Workload records and binary probing.
pub mod workload;

/// Engine contract, exit parsing and the external engine.
pub mod engine;
