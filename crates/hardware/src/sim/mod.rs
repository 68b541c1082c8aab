//! Workloads and the simulation lifecycle.
//!
//! Provides the workload record attached to a CPU, binary probing, the engine contract
//! and the lifecycle driver that runs a finalized graph to termination.

/// Engine contract, exit events and the dry-run engine.
pub mod engine;
/// Engine backed by an external simulator program.
pub mod external;
/// Syscall-emulation binary probing.
pub mod loader;
/// Lifecycle driver and phase state machine.
pub mod simulator;
/// Workload record (binary plus argument vector).
pub mod workload;

pub use engine::{DryRunEngine, Engine, ExitEvent, NORMAL_EXIT_CAUSE, TerminationCause};
pub use external::{ExternalEngine, parse_exit_line};
pub use loader::SeWorkload;
pub use simulator::{Phase, Simulation};
pub use workload::{Process, WorkloadArg};
