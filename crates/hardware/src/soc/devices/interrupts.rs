//! Per-thread interrupt controller.
//!
//! The controller is a child of its CPU and exposes the interrupt port triple:
//! `pio` (register access from the memory bus), `int_requestor` (interrupt messages sent
//! to the bus) and `int_responder` (interrupt messages received from the bus). All three
//! are mandatory; a CPU without a wired controller cannot be finalized.

use serde_json::{Value, json};

use crate::config::Isa;
use crate::soc::port::{PortRole, PortSpec};
use crate::soc::traits::{ComponentKind, Leaf};

const INTERRUPT_PORTS: &[PortSpec] = &[
    PortSpec::responder(PortRole::Pio),
    PortSpec::requestor(PortRole::IntRequestor),
    PortSpec::responder(PortRole::IntResponder),
];

/// Roles of the interrupt port triple, in wiring order.
pub const INTERRUPT_TRIPLE: [PortRole; 3] =
    [PortRole::Pio, PortRole::IntRequestor, PortRole::IntResponder];

/// Interrupt controller serving one hardware thread.
#[derive(Debug, Clone)]
pub struct InterruptController {
    isa: Isa,
    thread: usize,
}

impl InterruptController {
    /// Creates the controller for `thread` of a CPU implementing `isa`.
    pub const fn new(isa: Isa, thread: usize) -> Self {
        Self { isa, thread }
    }

    /// Simulator object type for the ISA.
    pub const fn object_type(&self) -> &'static str {
        match self.isa {
            Isa::X86 => "X86LocalApic",
            Isa::Riscv => "RiscvInterrupts",
            Isa::Arm => "ArmInterrupts",
        }
    }
}

impl Leaf for InterruptController {
    fn kind(&self) -> ComponentKind {
        ComponentKind::InterruptController
    }

    fn ports(&self) -> &'static [PortSpec] {
        INTERRUPT_PORTS
    }

    fn params(&self) -> Value {
        json!({
            "type": self.object_type(),
            "thread": self.thread,
        })
    }
}
