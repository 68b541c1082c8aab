//! CPU leaf component.
//!
//! A CPU exposes an instruction-fetch port and a data port toward its L1 caches, one
//! workload slot per hardware thread, and (once created) one interrupt controller per
//! thread.

use serde_json::{Value, json};

use super::port::{PortRole, PortSpec};
use super::traits::{ComponentKind, Leaf};
use crate::config::{CpuConfig, CpuModel, Isa};

const CPU_PORTS: &[PortSpec] = &[
    PortSpec::requestor(PortRole::IcachePort),
    PortSpec::requestor(PortRole::DcachePort),
];

/// A CPU core.
#[derive(Debug, Clone)]
pub struct Cpu {
    config: CpuConfig,
}

impl Cpu {
    /// Creates a CPU descriptor from its configuration.
    pub const fn new(config: CpuConfig) -> Self {
        Self { config }
    }

    /// Simulator object type, e.g. `X86O3CPU`.
    pub fn object_type(&self) -> String {
        let isa = match self.config.isa {
            Isa::X86 => "X86",
            Isa::Riscv => "Riscv",
            Isa::Arm => "Arm",
        };
        let model = match self.config.model {
            CpuModel::TimingSimple => "TimingSimpleCPU",
            CpuModel::AtomicSimple => "AtomicSimpleCPU",
            CpuModel::Minor => "MinorCPU",
            CpuModel::O3 => "O3CPU",
        };
        format!("{isa}{model}")
    }

    /// Instruction set of this CPU.
    pub const fn isa(&self) -> Isa {
        self.config.isa
    }
}

impl Leaf for Cpu {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Cpu
    }

    fn ports(&self) -> &'static [PortSpec] {
        CPU_PORTS
    }

    fn workload_slots(&self) -> usize {
        self.config.num_threads
    }

    fn params(&self) -> Value {
        json!({
            "type": self.object_type(),
            "num_threads": self.config.num_threads,
        })
    }
}
