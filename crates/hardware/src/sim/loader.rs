//! Syscall-emulation workload probing.
//!
//! Before a binary is attached to a CPU it is opened as an object file so that an
//! incompatible workload is rejected at configuration time:
//! 1. **Read:** The file is loaded from disk.
//! 2. **Parse:** The ELF header is parsed with `object`.
//! 3. **Check:** The object architecture must match the CPU's instruction set.

use std::fs;
use std::path::{Path, PathBuf};

use object::{Architecture, Object};
use serde::Serialize;
use tracing::debug;

use crate::common::error::ConfigError;
use crate::config::Isa;

/// Object architectures a CPU implementing `isa` can execute.
fn accepted(isa: Isa) -> &'static [Architecture] {
    match isa {
        Isa::X86 => &[Architecture::X86_64, Architecture::I386],
        Isa::Riscv => &[Architecture::Riscv64, Architecture::Riscv32],
        Isa::Arm => &[Architecture::Aarch64, Architecture::Arm],
    }
}

/// A binary checked to run under syscall emulation on a given ISA.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeWorkload {
    binary: PathBuf,
    isa: Isa,
    entry: u64,
}

impl SeWorkload {
    /// Opens `path` and checks it targets `isa`.
    ///
    /// # Arguments
    ///
    /// * `path` - Workload binary.
    /// * `isa` - Instruction set of the CPU that will run it.
    ///
    /// # Returns
    ///
    /// The probed workload, or `ConfigError::Io`, `ConfigError::Binary` or
    /// `ConfigError::IncompatibleBinary`.
    pub fn init_compatible(path: &Path, isa: Isa) -> Result<Self, ConfigError> {
        let data = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = object::File::parse(&*data).map_err(|e| ConfigError::Binary {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let arch = file.architecture();
        if !accepted(isa).contains(&arch) {
            return Err(ConfigError::IncompatibleBinary {
                path: path.to_path_buf(),
                found: format!("{arch:?}"),
                expected: format!("{isa:?}"),
            });
        }

        debug!(binary = %path.display(), ?arch, entry = file.entry(), "workload probed");
        Ok(Self {
            binary: path.to_path_buf(),
            isa,
            entry: file.entry(),
        })
    }

    /// Binary path.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Instruction set the binary was checked against.
    pub const fn isa(&self) -> Isa {
        self.isa
    }

    /// Entry point address from the object header.
    pub const fn entry(&self) -> u64 {
        self.entry
    }
}
