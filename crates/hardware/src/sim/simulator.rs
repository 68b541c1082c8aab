//! Lifecycle driver.
//!
//! `Simulation` owns the finalized graph and the injected engine after assembly and walks
//! the one-way state machine `Finalized -> Instantiated -> Running -> Terminated`. Every
//! out-of-order call is rejected with a `UsageError` before any state changes.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use super::engine::{Engine, ExitEvent};
use crate::common::error::{Result, UsageError};
use crate::soc::graph::FinalizedGraph;

/// Lifecycle phase of a system, from assembly to termination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No system has been created.
    Unbuilt,
    /// Components exist and are being wired.
    Assembling,
    /// The graph is frozen.
    Finalized,
    /// The engine has accepted the graph.
    Instantiated,
    /// `simulate` is in progress.
    Running,
    /// The run has ended.
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unbuilt => "unbuilt",
            Self::Assembling => "assembling",
            Self::Finalized => "finalized",
            Self::Instantiated => "instantiated",
            Self::Running => "running",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Drives a finalized graph through an engine.
#[derive(Debug)]
pub struct Simulation<E: Engine> {
    engine: E,
    graph: FinalizedGraph,
    phase: Phase,
    exit: Option<ExitEvent>,
}

impl<E: Engine> Simulation<E> {
    /// Takes ownership of `graph` and `engine`.
    pub const fn new(engine: E, graph: FinalizedGraph) -> Self {
        Self {
            engine,
            graph,
            phase: Phase::Finalized,
            exit: None,
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The graph being simulated.
    pub const fn graph(&self) -> &FinalizedGraph {
        &self.graph
    }

    /// The engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Exit event of the finished run, if any.
    pub const fn exit(&self) -> Option<&ExitEvent> {
        self.exit.as_ref()
    }

    /// Commits the graph to the engine.
    ///
    /// A second call is a `UsageError::AlreadyInstantiated`. If the engine rejects the
    /// graph the phase is unchanged, so the call may be retried.
    pub fn instantiate(&mut self) -> Result<()> {
        match self.phase {
            Phase::Finalized => {}
            Phase::Running => return Err(UsageError::Busy.into()),
            // `new` starts at `Finalized`, so only later phases reach here.
            _ => return Err(UsageError::AlreadyInstantiated.into()),
        }

        if let Err(e) = self.engine.instantiate(&self.graph) {
            warn!(error = %e, "engine rejected graph");
            return Err(e.into());
        }
        self.phase = Phase::Instantiated;
        info!(components = self.graph.graph().len(), "graph instantiated");
        Ok(())
    }

    /// Runs the engine to a termination condition.
    ///
    /// Blocks for the whole run. An engine failure still terminates the run; the error
    /// carries whatever tick and cause the engine reported.
    pub fn simulate(&mut self) -> Result<ExitEvent> {
        match self.phase {
            Phase::Instantiated => {}
            Phase::Running => return Err(UsageError::Busy.into()),
            Phase::Terminated => return Err(UsageError::AlreadyTerminated.into()),
            _ => return Err(UsageError::NotInstantiated.into()),
        }

        self.phase = Phase::Running;
        info!("beginning simulation");
        let result = self.engine.simulate(&self.graph);
        self.phase = Phase::Terminated;

        match result {
            Ok(event) => {
                info!(tick = event.tick, cause = %event.cause, "simulation exited");
                self.exit = Some(event.clone());
                Ok(event)
            }
            Err(e) => {
                warn!(error = %e, tick = ?e.tick, cause = ?e.cause, "engine failed");
                Err(e.into())
            }
        }
    }

    /// Emits the final tick and cause.
    ///
    /// # Returns
    ///
    /// The line printed by the driver, `Exiting @ tick <N> because <cause>`.
    pub fn report(&self, event: &ExitEvent) -> String {
        let line = event.to_string();
        info!(tick = event.tick, cause = %event.cause, kind = %event.kind(), "{line}");
        line
    }
}
