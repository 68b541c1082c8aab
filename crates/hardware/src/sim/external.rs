//! Out-of-process engine.
//!
//! `ExternalEngine` hands the finalized graph to a separate simulator program. It works
//! in two steps:
//! 1. **Instantiate:** Writes the graph as JSON to the configured dump path.
//! 2. **Simulate:** Runs the program with the dump path as its last argument and parses
//!    the `Exiting @ tick <N> because <cause>` line from its standard output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::engine::{Engine, ExitEvent};
use crate::common::clock::Tick;
use crate::common::error::EngineError;
use crate::soc::graph::FinalizedGraph;

const EXIT_PREFIX: &str = "Exiting @ tick ";
const CAUSE_SEPARATOR: &str = " because ";

/// Parses an `Exiting @ tick <N> because <cause>` line.
///
/// # Returns
///
/// The exit event, or `None` if the line has another shape.
pub fn parse_exit_line(line: &str) -> Option<ExitEvent> {
    let rest = line.trim().strip_prefix(EXIT_PREFIX)?;
    let (tick, cause) = rest.split_once(CAUSE_SEPARATOR)?;
    let tick: Tick = tick.trim().parse().ok()?;
    Some(ExitEvent::new(cause.trim(), tick))
}

/// Engine that runs an external simulator program.
#[derive(Clone, Debug)]
pub struct ExternalEngine {
    program: PathBuf,
    args: Vec<String>,
    config_path: PathBuf,
    instantiated: bool,
}

impl ExternalEngine {
    /// Creates an engine running `program`, dumping the graph to `config_path`.
    pub fn new(program: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            config_path: config_path.into(),
            instantiated: false,
        }
    }

    /// Adds arguments passed before the dump path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path the graph is dumped to.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl Engine for ExternalEngine {
    fn instantiate(&mut self, graph: &FinalizedGraph) -> Result<(), EngineError> {
        let json = graph
            .to_json()
            .map_err(|e| EngineError::new(format!("cannot serialize graph: {e}")))?;
        fs::write(&self.config_path, json).map_err(|e| {
            EngineError::new(format!(
                "cannot write config dump `{}`: {e}",
                self.config_path.display()
            ))
        })?;
        debug!(path = %self.config_path.display(), "config dump written");
        self.instantiated = true;
        Ok(())
    }

    fn simulate(&mut self, _graph: &FinalizedGraph) -> Result<ExitEvent, EngineError> {
        if !self.instantiated {
            return Err(EngineError::new("config dump was never written"));
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.config_path)
            .output()
            .map_err(|e| {
                EngineError::new(format!("cannot run `{}`: {e}", self.program.display()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let event = stdout.lines().rev().find_map(parse_exit_line);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "engine exited abnormally");
            return Err(EngineError {
                message: format!(
                    "`{}` exited with {}: {}",
                    self.program.display(),
                    output.status,
                    stderr.trim()
                ),
                tick: event.as_ref().map(|e| e.tick),
                cause: event.map(|e| e.cause),
            });
        }

        event.ok_or_else(|| {
            EngineError::new(format!(
                "`{}` finished without reporting an exit event",
                self.program.display()
            ))
        })
    }
}
