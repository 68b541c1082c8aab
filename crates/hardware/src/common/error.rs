//! Error taxonomy for assembly and simulation.
//!
//! This module defines every failure the assembler and the lifecycle driver can report:
//! 1. **Configuration:** Bad or missing option values, detected before any component exists.
//! 2. **Topology:** Structural violations of the port graph (double connections, dangling
//!    mandatory ports, missing prerequisite steps, cycles).
//! 3. **Engine:** Opaque failures reported by the simulation engine, surfaced verbatim.
//! 4. **Usage:** Lifecycle calls issued out of order (e.g. `simulate` before `instantiate`).
//!
//! None of these are recovered from in-process; they are propagated to the caller, which
//! is expected to halt before any simulated time elapses.

use std::path::PathBuf;

use thiserror::Error;

use super::clock::Tick;

/// Bad or missing configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The declared physical address range has zero bytes.
    #[error("address range `{0}` is empty; memory size must be a positive byte count")]
    EmptyAddressRange(String),

    /// The clock frequency parsed to zero or a negative value.
    #[error("clock `{0}` is not positive")]
    NonPositiveClock(String),

    /// The voltage parsed to zero or a negative value.
    #[error("voltage `{0}` is not positive")]
    NonPositiveVoltage(String),

    /// A memory size string could not be parsed.
    #[error("invalid memory size `{0}`")]
    InvalidSize(String),

    /// A frequency string could not be parsed.
    #[error("invalid frequency `{0}`")]
    InvalidFrequency(String),

    /// A voltage string could not be parsed.
    #[error("invalid voltage `{0}`")]
    InvalidVoltage(String),

    /// A cache level carries inconsistent parameters.
    #[error("invalid {level} cache: {reason}")]
    InvalidCache {
        /// Display name of the level (e.g. `L2`).
        level: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The CPU was configured with zero hardware threads.
    #[error("cpu must have at least one hardware thread")]
    NoThreads,

    /// Two memory controllers claim overlapping address ranges.
    #[error("memory controller `{controller}` range {range} overlaps `{other}`")]
    OverlappingRanges {
        /// Controller being attached.
        controller: String,
        /// The range it was asked to manage.
        range: String,
        /// Controller already owning part of that range.
        other: String,
    },

    /// A controller was bound to a range the system never declared.
    #[error("range {range} for `{controller}` is not inside any system memory range")]
    RangeOutsideSystem {
        /// Controller being attached.
        controller: String,
        /// The offending range.
        range: String,
    },

    /// The configuration document is not valid JSON for [`crate::config::Config`].
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file or a workload binary could not be read.
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The workload binary is not a loadable object file.
    #[error("cannot parse workload binary `{}`: {reason}", path.display())]
    Binary {
        /// Binary path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The workload binary targets another architecture than the CPU.
    #[error("workload binary `{}` is {found}, cpu expects {expected}", path.display())]
    IncompatibleBinary {
        /// Binary path.
        path: PathBuf,
        /// Architecture found in the object header.
        found: String,
        /// Architecture required by the CPU model.
        expected: String,
    },
}

/// Structural violation of the system graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A single port already has a peer.
    #[error("port `{port}` is already connected to `{peer}`")]
    PortOccupied {
        /// Port that was asked to take a second connection.
        port: String,
        /// Its existing peer.
        peer: String,
    },

    /// Both endpoints are requestors, or both are responders.
    #[error("cannot connect `{from}` to `{to}`: both ports are {kind}s")]
    IncompatiblePorts {
        /// First endpoint.
        from: String,
        /// Second endpoint.
        to: String,
        /// Shared port kind.
        kind: String,
    },

    /// A component id does not belong to this graph.
    #[error("unknown component #{0}")]
    UnknownComponent(usize),

    /// A port id does not belong to this graph.
    #[error("unknown port #{0}")]
    UnknownPortId(usize),

    /// A component does not expose the requested port.
    #[error("component `{component}` has no `{role}` port")]
    UnknownPort {
        /// Component path.
        component: String,
        /// Requested role.
        role: String,
    },

    /// The component handed to an operation is of the wrong kind.
    #[error("`{component}` is a {found}, expected a {expected}")]
    WrongKind {
        /// Component path.
        component: String,
        /// Kind that was required.
        expected: String,
        /// Kind that was supplied.
        found: String,
    },

    /// Wiring would skip a hierarchy level or run it backwards.
    #[error("cannot place `{component}` ({tier}) below `{upper}` ({upper_tier})")]
    LevelOrder {
        /// Component being placed.
        component: String,
        /// Its tier.
        tier: String,
        /// The component it would feed.
        upper: String,
        /// That component's tier.
        upper_tier: String,
    },

    /// Interrupt wiring was requested before the controller was created.
    #[error("cpu `{cpu}` has no interrupt controller; unconnected: {}", unconnected.join(", "))]
    MissingInterruptController {
        /// CPU path.
        cpu: String,
        /// The interrupt port triple left unconnected.
        unconnected: Vec<String>,
    },

    /// A workload was attached to a CPU that already has one.
    #[error("cpu `{0}` already has a workload")]
    WorkloadAlreadyAttached(String),

    /// Finalization found dangling mandatory ports.
    #[error("unconnected mandatory ports: {}", ports.join(", "))]
    Unconnected {
        /// Every dangling port, in graph order.
        ports: Vec<String>,
    },

    /// Finalization found components unreachable from the system root.
    #[error("components not reachable from the system root: {}", components.join(", "))]
    Disconnected {
        /// Unreachable component paths.
        components: Vec<String>,
    },

    /// The memory hierarchy contains a cycle.
    #[error("memory hierarchy contains a cycle through: {}", components.join(", "))]
    Cycle {
        /// Components on or behind the cycle.
        components: Vec<String>,
    },

    /// A CPU has no directed path to a memory controller.
    #[error("no path from `{from}` to a memory controller")]
    NoPathToMemory {
        /// CPU path.
        from: String,
    },
}

/// Failure reported by the simulation engine.
///
/// Carries whatever partial progress the engine reported; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine error: {message}")]
pub struct EngineError {
    /// Engine message, verbatim.
    pub message: String,
    /// Last tick the engine reached, if known.
    pub tick: Option<Tick>,
    /// Termination cause, if the engine produced one before failing.
    pub cause: Option<String>,
}

impl EngineError {
    /// Creates an engine error with no partial progress information.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tick: None,
            cause: None,
        }
    }
}

/// Lifecycle call issued out of order.
///
/// These indicate a bug in the calling configuration, not a runtime condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A structural edit was issued before `create_system`.
    #[error("system has not been created")]
    SystemNotCreated,
    /// `create_system` was called twice.
    #[error("system was already created")]
    SystemAlreadyCreated,
    /// A structural edit was issued after `finalize`.
    #[error("graph is finalized; no further structural edits are permitted")]
    GraphFrozen,
    /// `instantiate` was called a second time.
    #[error("graph was already instantiated")]
    AlreadyInstantiated,
    /// `simulate` was called before `instantiate`.
    #[error("graph must be instantiated before simulating")]
    NotInstantiated,
    /// `simulate` was called after the run terminated.
    #[error("simulation already terminated")]
    AlreadyTerminated,
    /// A lifecycle call was issued while the engine is running.
    #[error("simulation is running")]
    Busy,
}

/// Any failure of the assembler or the lifecycle driver.
#[derive(Debug, Error)]
pub enum SimError {
    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// See [`TopologyError`].
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// See [`EngineError`].
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// See [`UsageError`].
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
