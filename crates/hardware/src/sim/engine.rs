//! Engine contract.
//!
//! The lifecycle driver consumes exactly two capabilities from the simulation engine:
//! `instantiate` and `simulate`. This module defines that contract, the exit event the
//! engine reports, a classification of its cause strings, and the built-in dry-run engine.

use std::fmt;

use serde::Serialize;

use crate::common::clock::Tick;
use crate::common::error::EngineError;
use crate::soc::graph::FinalizedGraph;

/// Cause reported when the last thread context of the workload exits.
pub const NORMAL_EXIT_CAUSE: &str = "exiting with last active thread context";

/// Why a simulation run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    /// The workload ran to completion.
    NormalExit,
    /// A configured tick limit was reached.
    TickLimit,
    /// A breakpoint or debugger trap stopped the run.
    Breakpoint,
    /// The simulated program or the engine faulted.
    Fault,
    /// An external signal stopped the run.
    Signal,
    /// Anything the classification does not recognize.
    Other,
}

impl TerminationCause {
    /// Classifies an engine cause string.
    pub fn classify(cause: &str) -> Self {
        let cause = cause.to_ascii_lowercase();
        if cause == NORMAL_EXIT_CAUSE || cause.contains("normal exit") || cause == "exit" {
            Self::NormalExit
        } else if cause.contains("limit") || cause.contains("max tick") {
            Self::TickLimit
        } else if cause.contains("breakpoint") || cause.contains("debug") {
            Self::Breakpoint
        } else if cause.contains("fault") || cause.contains("panic") || cause.contains("fatal") {
            Self::Fault
        } else if cause.contains("signal") || cause.contains("interrupt") || cause.contains("kill")
        {
            Self::Signal
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NormalExit => "normal exit",
            Self::TickLimit => "tick limit",
            Self::Breakpoint => "breakpoint",
            Self::Fault => "fault",
            Self::Signal => "signal",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Termination event reported by `simulate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExitEvent {
    /// Engine cause string, verbatim.
    pub cause: String,
    /// Simulated time at exit, in ticks.
    pub tick: Tick,
}

impl ExitEvent {
    /// Creates an exit event.
    pub fn new(cause: impl Into<String>, tick: Tick) -> Self {
        Self {
            cause: cause.into(),
            tick,
        }
    }

    /// A normal workload exit at `tick`.
    pub fn normal(tick: Tick) -> Self {
        Self::new(NORMAL_EXIT_CAUSE, tick)
    }

    /// Classified cause.
    pub fn kind(&self) -> TerminationCause {
        TerminationCause::classify(&self.cause)
    }
}

impl fmt::Display for ExitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exiting @ tick {} because {}", self.tick, self.cause)
    }
}

/// The simulation engine, injected into [`crate::sim::Simulation`].
pub trait Engine {
    /// Commits the frozen graph to the engine; called once.
    fn instantiate(&mut self, graph: &FinalizedGraph) -> Result<(), EngineError>;

    /// Runs until a termination condition; blocks the caller for the whole run.
    fn simulate(&mut self, graph: &FinalizedGraph) -> Result<ExitEvent, EngineError>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn instantiate(&mut self, graph: &FinalizedGraph) -> Result<(), EngineError> {
        (**self).instantiate(graph)
    }

    fn simulate(&mut self, graph: &FinalizedGraph) -> Result<ExitEvent, EngineError> {
        (**self).simulate(graph)
    }
}

/// Engine that accepts any finalized graph and exits normally without advancing time.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunEngine {
    instantiated: bool,
}

impl DryRunEngine {
    /// Creates a dry-run engine.
    pub const fn new() -> Self {
        Self {
            instantiated: false,
        }
    }
}

impl Engine for DryRunEngine {
    fn instantiate(&mut self, graph: &FinalizedGraph) -> Result<(), EngineError> {
        if graph.cpus().iter().any(|&cpu| {
            graph
                .graph()
                .component(cpu)
                .ok()
                .is_none_or(|c| c.workload().is_none())
        }) {
            return Err(EngineError::new("cpu has no workload to run"));
        }
        self.instantiated = true;
        Ok(())
    }

    fn simulate(&mut self, _graph: &FinalizedGraph) -> Result<ExitEvent, EngineError> {
        if !self.instantiated {
            return Err(EngineError::new(
                "simulate called on an engine that was never instantiated",
            ));
        }
        Ok(ExitEvent::normal(0))
    }
}
