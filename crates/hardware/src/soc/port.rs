//! Port model for component interfaces.
//!
//! Every component exposes a fixed, typed set of ports. A connection always joins one
//! requestor port to one responder port. Single ports accept at most one peer; vector
//! ports (crossbar port sets) grow one element per connection.

use std::fmt;

use serde::Serialize;

/// Stable index of a port in the system graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PortId(pub(crate) usize);

impl PortId {
    /// Raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The role a port plays on its component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortRole {
    /// Cache port facing the CPU (toward L1).
    CpuSide,
    /// Cache port facing memory.
    MemSide,
    /// Crossbar port set facing the CPU.
    CpuSidePorts,
    /// Crossbar port set facing memory.
    MemSidePorts,
    /// CPU instruction-fetch port.
    IcachePort,
    /// CPU data port.
    DcachePort,
    /// Interrupt controller programmed-I/O port.
    Pio,
    /// Interrupt controller port issuing interrupt messages.
    IntRequestor,
    /// Interrupt controller port receiving interrupt messages.
    IntResponder,
    /// Functional access port of the system root.
    SystemPort,
    /// Memory controller port.
    Port,
}

impl PortRole {
    /// Port name as it appears in component paths.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CpuSide => "cpu_side",
            Self::MemSide => "mem_side",
            Self::CpuSidePorts => "cpu_side_ports",
            Self::MemSidePorts => "mem_side_ports",
            Self::IcachePort => "icache_port",
            Self::DcachePort => "dcache_port",
            Self::Pio => "pio",
            Self::IntRequestor => "int_requestor",
            Self::IntResponder => "int_responder",
            Self::SystemPort => "system_port",
            Self::Port => "port",
        }
    }

    /// Interrupt ports form a side channel that is not part of the memory hierarchy.
    pub const fn is_side_channel(self) -> bool {
        matches!(self, Self::Pio | Self::IntRequestor | Self::IntResponder)
    }
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which end of a connection a port can be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Issues requests; points toward memory.
    Requestor,
    /// Serves requests; points toward the CPU.
    Responder,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requestor => f.write_str("requestor"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

/// How many peers a port may have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly one peer.
    Single,
    /// Any number of peers, one element each.
    Vector,
}

/// Static description of one port of a component kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PortSpec {
    /// Role of the port.
    pub role: PortRole,
    /// Requestor or responder.
    pub kind: PortKind,
    /// Single or vector.
    pub arity: Arity,
    /// Whether finalization requires at least one connection.
    pub mandatory: bool,
}

impl PortSpec {
    /// A mandatory single requestor port.
    pub const fn requestor(role: PortRole) -> Self {
        Self {
            role,
            kind: PortKind::Requestor,
            arity: Arity::Single,
            mandatory: true,
        }
    }

    /// A mandatory single responder port.
    pub const fn responder(role: PortRole) -> Self {
        Self {
            role,
            kind: PortKind::Responder,
            arity: Arity::Single,
            mandatory: true,
        }
    }

    /// Turns this spec into a vector port.
    pub const fn vector(mut self) -> Self {
        self.arity = Arity::Vector;
        self
    }

    /// Marks this port as optional.
    pub const fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }
}
