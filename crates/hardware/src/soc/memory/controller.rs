//! DRAM memory controller leaf.
//!
//! The controller is the terminal leaf of the hierarchy: a single responder `port` fed
//! by the system crossbar. The address range it manages is bound when it is attached;
//! the DRAM interface behind it is opaque to the assembler.

use serde_json::{Value, json};

use crate::config::DramInterface;
use crate::soc::level::Tier;
use crate::soc::port::{PortRole, PortSpec};
use crate::soc::traits::{ComponentKind, Leaf};

const MEM_CTRL_PORTS: &[PortSpec] = &[PortSpec::responder(PortRole::Port)];

/// A memory controller with one DRAM interface.
#[derive(Debug, Clone)]
pub struct MemCtrl {
    dram: DramInterface,
}

impl MemCtrl {
    /// Creates a controller driving `dram`.
    pub const fn new(dram: DramInterface) -> Self {
        Self { dram }
    }

    /// DRAM interface behind this controller.
    pub const fn dram(&self) -> DramInterface {
        self.dram
    }
}

impl Leaf for MemCtrl {
    fn kind(&self) -> ComponentKind {
        ComponentKind::MemCtrl
    }

    fn ports(&self) -> &'static [PortSpec] {
        MEM_CTRL_PORTS
    }

    fn tier(&self) -> Option<Tier> {
        Some(Tier::Memory)
    }

    fn params(&self) -> Value {
        json!({
            "type": "MemCtrl",
            "dram": self.dram.name(),
        })
    }
}
