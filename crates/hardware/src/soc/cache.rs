//! Cache leaf component.
//!
//! Every cache, whatever its level, has the same two ports: `cpu_side` (responder, fed by
//! the CPU or by the crossbar above it) and `mem_side` (requestor, feeding the crossbar
//! below it). Capacity, associativity and latencies are opaque to the assembler.

use serde_json::{Value, json};

use super::level::Tier;
use super::port::{PortRole, PortSpec};
use super::traits::{ComponentKind, Leaf};
use crate::config::CacheConfig;

const CACHE_PORTS: &[PortSpec] = &[
    PortSpec::responder(PortRole::CpuSide),
    PortSpec::requestor(PortRole::MemSide),
];

/// What a cache holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheRole {
    /// L1 instruction cache.
    Instruction,
    /// L1 data cache.
    Data,
    /// Shared (unified) cache.
    Unified,
}

/// A cache at one hierarchy level.
#[derive(Debug, Clone)]
pub struct Cache {
    level: u8,
    role: CacheRole,
    config: CacheConfig,
}

impl Cache {
    /// Creates a cache at `level` (1 for L1).
    pub const fn new(level: u8, role: CacheRole, config: CacheConfig) -> Self {
        Self {
            level,
            role,
            config,
        }
    }

    /// L1 instruction cache.
    pub const fn l1_instruction(config: CacheConfig) -> Self {
        Self::new(1, CacheRole::Instruction, config)
    }

    /// L1 data cache.
    pub const fn l1_data(config: CacheConfig) -> Self {
        Self::new(1, CacheRole::Data, config)
    }

    /// Shared cache at `level`.
    pub const fn unified(level: u8, config: CacheConfig) -> Self {
        Self::new(level, CacheRole::Unified, config)
    }

    /// Role of this cache.
    pub const fn role(&self) -> CacheRole {
        self.role
    }

    /// Simulator object type, e.g. `L1ICache` or `L3Cache`.
    pub fn object_type(&self) -> String {
        match self.role {
            CacheRole::Instruction => "L1ICache".to_string(),
            CacheRole::Data => "L1DCache".to_string(),
            CacheRole::Unified => format!("L{}Cache", self.level),
        }
    }
}

impl Leaf for Cache {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Cache
    }

    fn ports(&self) -> &'static [PortSpec] {
        CACHE_PORTS
    }

    fn tier(&self) -> Option<Tier> {
        Some(Tier::Cache(self.level))
    }

    fn params(&self) -> Value {
        json!({
            "type": self.object_type(),
            "size": self.config.size,
            "assoc": self.config.assoc,
            "tag_latency": self.config.tag_latency,
            "data_latency": self.config.data_latency,
            "response_latency": self.config.response_latency,
            "mshrs": self.config.mshrs,
            "tgts_per_mshr": self.config.tgts_per_mshr,
            "replacement_policy": self.config.policy,
        })
    }
}
