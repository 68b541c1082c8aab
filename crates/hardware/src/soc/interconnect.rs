//! Crossbar interconnects.
//!
//! This module implements the switching nodes that join hierarchy levels. It provides:
//! 1. **Port sets:** A CPU-facing responder vector and a memory-facing requestor vector;
//!    each connection adds one element, so many caches can share one crossbar.
//! 2. **Flavors:** `L2XBar`-style crossbars between cache levels and the `SystemXBar`
//!    at the memory tier, which also carries the interrupt side channel and system port.
//! 3. **Parameters:** Width and latencies, forwarded opaquely to the engine.

use serde_json::{Value, json};

use super::level::Tier;
use super::port::{PortRole, PortSpec};
use super::traits::{ComponentKind, Leaf};

const XBAR_PORTS: &[PortSpec] = &[
    PortSpec::responder(PortRole::CpuSidePorts).vector(),
    PortSpec::requestor(PortRole::MemSidePorts).vector(),
];

/// Timing parameters of a crossbar flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XBarTiming {
    /// Datapath width in bytes.
    pub width: u32,
    /// Cycles to accept a packet.
    pub frontend_latency: u32,
    /// Cycles to forward a request.
    pub forward_latency: u32,
    /// Cycles to forward a response.
    pub response_latency: u32,
    /// Cycles to forward a snoop response.
    pub snoop_response_latency: u32,
}

impl XBarTiming {
    /// Timing of crossbars between cache levels.
    pub const CACHE_LEVEL: Self = Self {
        width: 32,
        frontend_latency: 1,
        forward_latency: 0,
        response_latency: 1,
        snoop_response_latency: 1,
    };

    /// Timing of the system (memory-tier) crossbar.
    pub const SYSTEM: Self = Self {
        width: 16,
        frontend_latency: 3,
        forward_latency: 4,
        response_latency: 2,
        snoop_response_latency: 4,
    };
}

/// A coherent crossbar feeding the components of one tier.
#[derive(Debug, Clone)]
pub struct Crossbar {
    tier: Tier,
    timing: XBarTiming,
}

impl Crossbar {
    /// Creates the crossbar whose memory side feeds `tier`.
    ///
    /// Memory-tier crossbars get system timing; every other tier gets cache-level timing.
    pub const fn new(tier: Tier) -> Self {
        let timing = match tier {
            Tier::Memory => XBarTiming::SYSTEM,
            Tier::Cache(_) => XBarTiming::CACHE_LEVEL,
        };
        Self { tier, timing }
    }

    /// Overrides the timing parameters.
    pub const fn with_timing(mut self, timing: XBarTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Simulator object type: `L<n>XBar` or `SystemXBar`.
    pub fn object_type(&self) -> String {
        match self.tier {
            Tier::Cache(n) => format!("L{n}XBar"),
            Tier::Memory => "SystemXBar".to_string(),
        }
    }

    /// Conventional instance name: `l<n>bus` or `membus`.
    pub fn instance_name(&self) -> String {
        match self.tier {
            Tier::Cache(n) => format!("l{n}bus"),
            Tier::Memory => "membus".to_string(),
        }
    }
}

impl Leaf for Crossbar {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Crossbar
    }

    fn ports(&self) -> &'static [PortSpec] {
        XBAR_PORTS
    }

    fn tier(&self) -> Option<Tier> {
        Some(self.tier)
    }

    fn params(&self) -> Value {
        let memory_tier = self.tier == Tier::Memory;
        json!({
            "type": self.object_type(),
            "width": self.timing.width,
            "frontend_latency": self.timing.frontend_latency,
            "forward_latency": self.timing.forward_latency,
            "response_latency": self.timing.response_latency,
            "snoop_response_latency": self.timing.snoop_response_latency,
            "point_of_coherency": memory_tier,
            "point_of_unification": memory_tier,
        })
    }
}
