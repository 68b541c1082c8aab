//! Workload records attached to a CPU.
//!
//! A workload is the binary a simulated CPU executes plus its argument vector. It is
//! created once from configuration, attached before finalization, and never edited after.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::WorkloadConfig;

/// One argument of a workload command line.
///
/// Integers and strings are kept distinct so an argument vector such as
/// `["-ns", 16, "-sm", 5000]` reaches the CPU exactly as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkloadArg {
    /// Integer argument.
    Int(i64),
    /// String argument.
    Str(String),
}

impl fmt::Display for WorkloadArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for WorkloadArg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for WorkloadArg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for WorkloadArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// A user-mode process: what a CPU's workload slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Process {
    executable: PathBuf,
    cmd: Vec<WorkloadArg>,
}

impl Process {
    /// Creates a process running `executable` with `args`.
    ///
    /// The command vector begins with the executable, like `argv`.
    pub fn new(
        executable: impl Into<PathBuf>,
        args: impl IntoIterator<Item = WorkloadArg>,
    ) -> Self {
        let executable = executable.into();
        let mut cmd = vec![WorkloadArg::Str(executable.display().to_string())];
        cmd.extend(args);
        Self { executable, cmd }
    }

    /// Builds the process described by the workload section of a configuration.
    pub fn from_config(config: &WorkloadConfig) -> Self {
        Self::new(config.binary.clone(), config.args.iter().cloned())
    }

    /// Path of the executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Full command vector, executable first.
    pub fn cmd(&self) -> &[WorkloadArg] {
        &self.cmd
    }

    /// Arguments after the executable.
    pub fn args(&self) -> &[WorkloadArg] {
        &self.cmd[1..]
    }

    /// The command vector rendered as strings.
    pub fn argv(&self) -> Vec<String> {
        self.cmd.iter().map(ToString::to_string).collect()
    }
}
