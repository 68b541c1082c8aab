//! Configuration system for the hierarchy assembler.
//!
//! This module defines all configuration structures and enums used to parameterize the
//! simulated system. It provides:
//! 1. **Defaults:** Baseline values (1GHz clock, 512MB of DRAM, O3 CPU, L1-I/L1-D/L2/L3).
//! 2. **Structures:** Hierarchical config for system, CPU, caches, memory, and workload.
//! 3. **Enums:** Memory mode, CPU model, replacement policy, and DRAM interface types.
//! 4. **Validation:** Type and range checks performed before any component is created.
//!
//! Configuration is supplied as JSON (`Config::from_json_str` / `Config::from_file`) or
//! built with `Config::default()`. Cache and controller parameters are carried opaquely to
//! the leaf components; only sizes, clock and thread counts are interpreted here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::addr::{AddrRange, parse_size};
use crate::common::clock::{ClockDomain, VoltageDomain};
use crate::common::error::ConfigError;
use crate::sim::workload::WorkloadArg;

/// Most shared cache levels below L1; levels are numbered `L2` through `L255`.
pub const MAX_SHARED_LEVELS: usize = 254;

/// Default configuration constants.
///
/// These values reproduce the classic single-CPU, three-level learning configuration when
/// not explicitly overridden.
mod defaults {
    /// System clock frequency.
    pub const CLOCK: &str = "1GHz";

    /// Supply voltage of the system clock domain.
    pub const VOLTAGE: &str = "1V";

    /// Size of the single physical memory range.
    pub const MEM_SIZE: &str = "512MB";

    /// Hardware threads per CPU.
    pub const NUM_THREADS: usize = 1;

    /// Workload binary used when none is given.
    pub const BINARY: &str = "tests/test-progs/hello/bin/x86/linux/hello";

    /// Generic cache size when a level omits it.
    pub const CACHE_SIZE: &str = "16kB";

    /// Generic associativity.
    pub const CACHE_ASSOC: usize = 2;

    /// Generic tag/data/response latency in cycles.
    pub const CACHE_LATENCY: u64 = 2;

    /// Generic miss status holding registers.
    pub const CACHE_MSHRS: usize = 4;

    /// Generic targets per MSHR.
    pub const CACHE_TGTS_PER_MSHR: usize = 20;

    /// Cache line size assumed when checking that every way holds at least one line.
    pub const CACHE_LINE: u64 = 64;
}

/// Memory access mode of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemMode {
    /// Timing accesses with full latency modeling.
    #[default]
    Timing,
    /// Atomic accesses with approximate latency.
    Atomic,
    /// Atomic accesses that bypass caches.
    AtomicNoncaching,
}

/// Instruction set of the CPU model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Isa {
    /// x86-64.
    #[default]
    X86,
    /// RISC-V 64-bit.
    #[serde(alias = "RISCV")]
    Riscv,
    /// AArch64.
    #[serde(alias = "ARM")]
    Arm,
}

/// CPU timing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CpuModel {
    /// Single-issue in-order CPU with timing memory accesses.
    TimingSimple,
    /// Atomic (functional-fast) CPU.
    AtomicSimple,
    /// Four-stage in-order pipeline.
    Minor,
    /// Out-of-order superscalar CPU.
    #[default]
    #[serde(alias = "OoO")]
    O3,
}

/// Cache replacement policy handed to the cache leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReplacementPolicy {
    /// Least recently used.
    #[default]
    #[serde(alias = "LRU")]
    Lru,
    /// Tree-based pseudo-LRU.
    #[serde(alias = "TreePLRU")]
    TreePlru,
    /// First in, first out.
    #[serde(alias = "FIFO")]
    Fifo,
    /// Random victim.
    Random,
    /// Most recently used.
    #[serde(alias = "MRU")]
    Mru,
    /// Bimodal re-reference interval prediction.
    #[serde(alias = "BRRIP")]
    Brrip,
    /// Signature-based hit predictor over BRRIP.
    #[serde(alias = "TSHiP", alias = "T-SHiP")]
    TShip,
}

/// DRAM device interface behind the memory controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DramInterface {
    /// DDR3-1600, 8 devices of x8.
    #[default]
    #[serde(rename = "DDR3_1600_8x8")]
    Ddr3,
    /// DDR4-2400, 8 devices of x8.
    #[serde(rename = "DDR4_2400_8x8")]
    Ddr4,
    /// LPDDR3-1600, single x32 device.
    #[serde(rename = "LPDDR3_1600_1x32")]
    Lpddr3,
    /// HBM-1000, 4-high stack, x128 channel.
    #[serde(rename = "HBM_1000_4H_1x128")]
    Hbm,
}

impl DramInterface {
    /// Interface name as used in component parameters.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ddr3 => "DDR3_1600_8x8",
            Self::Ddr4 => "DDR4_2400_8x8",
            Self::Lpddr3 => "LPDDR3_1600_1x32",
            Self::Hbm => "HBM_1000_4H_1x128",
        }
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use memhier_core::config::{Config, CpuModel};
///
/// let config = Config::default();
/// assert_eq!(config.system.mem_size, "512MB");
/// assert_eq!(config.cpu.model, CpuModel::O3);
/// assert_eq!(config.cache.levels.len(), 2);
/// ```
///
/// Deserializing from JSON; omitted sections keep their defaults:
///
/// ```
/// use memhier_core::config::Config;
///
/// let json = r#"{
///     "system": { "clock": "2GHz", "mem_size": "1GB" },
///     "cache": {
///         "levels": [ { "size": "512kB", "assoc": 8 } ]
///     },
///     "workload": { "binary": "/bin/true", "args": ["-n", 4] }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.system.clock, "2GHz");
/// assert_eq!(config.cache.levels.len(), 1);
/// assert_eq!(config.workload.args.len(), 2);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Clock, voltage, memory mode and physical memory size.
    #[serde(default)]
    pub system: SystemConfig,
    /// CPU model and thread count.
    #[serde(default)]
    pub cpu: CpuConfig,
    /// Cache hierarchy.
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// Main memory controller.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Workload binary and arguments.
    #[serde(default)]
    pub workload: WorkloadConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks every value for type and range.
    ///
    /// This runs before assembly begins; a failing configuration never constructs a
    /// component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.system.mem_range()?;
        let _ = self.system.clock_domain()?;
        let _ = self.system.voltage_domain()?;

        if self.cpu.num_threads == 0 {
            return Err(ConfigError::NoThreads);
        }

        if self.cache.levels.len() > MAX_SHARED_LEVELS {
            return Err(ConfigError::InvalidCache {
                level: format!("L{}", self.cache.levels.len() + 1),
                reason: "too many cache levels".to_string(),
            });
        }

        self.cache.l1_i.validate("L1-I")?;
        self.cache.l1_d.validate("L1-D")?;
        for (i, level) in self.cache.levels.iter().enumerate() {
            level.validate(&format!("L{}", i + 2))?;
        }
        Ok(())
    }
}

/// System-wide parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Clock of the system clock domain (e.g. `"1GHz"` or `"1ns"`).
    #[serde(default = "SystemConfig::default_clock")]
    pub clock: String,

    /// Voltage of the system voltage domain.
    #[serde(default = "SystemConfig::default_voltage")]
    pub voltage: String,

    /// Memory access mode.
    #[serde(default)]
    pub mem_mode: MemMode,

    /// Size of the physical memory range, starting at address zero.
    #[serde(default = "SystemConfig::default_mem_size")]
    pub mem_size: String,
}

impl SystemConfig {
    fn default_clock() -> String {
        defaults::CLOCK.to_string()
    }

    fn default_voltage() -> String {
        defaults::VOLTAGE.to_string()
    }

    fn default_mem_size() -> String {
        defaults::MEM_SIZE.to_string()
    }

    /// The declared physical memory range.
    pub fn mem_range(&self) -> Result<AddrRange, ConfigError> {
        AddrRange::from_size_str(&self.mem_size)
    }

    /// The parsed system clock domain.
    pub fn clock_domain(&self) -> Result<ClockDomain, ConfigError> {
        ClockDomain::parse(&self.clock)
    }

    /// The parsed system voltage domain.
    pub fn voltage_domain(&self) -> Result<VoltageDomain, ConfigError> {
        VoltageDomain::parse(&self.voltage)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            clock: defaults::CLOCK.to_string(),
            voltage: defaults::VOLTAGE.to_string(),
            mem_mode: MemMode::default(),
            mem_size: defaults::MEM_SIZE.to_string(),
        }
    }
}

/// CPU parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuConfig {
    /// Instruction set.
    #[serde(default)]
    pub isa: Isa,

    /// Timing model.
    #[serde(default)]
    pub model: CpuModel,

    /// Hardware thread contexts; one interrupt controller is created per thread.
    #[serde(default = "CpuConfig::default_threads")]
    pub num_threads: usize,
}

impl CpuConfig {
    fn default_threads() -> usize {
        defaults::NUM_THREADS
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            isa: Isa::default(),
            model: CpuModel::default(),
            num_threads: defaults::NUM_THREADS,
        }
    }
}

/// Cache hierarchy configuration.
///
/// The split L1 caches are always present. Every entry of `levels` adds one shared level
/// below them (`levels[0]` is L2, `levels[1]` is L3, ...), each behind its own crossbar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHierarchyConfig {
    /// L1 instruction cache.
    #[serde(default = "CacheConfig::l1_instruction")]
    pub l1_i: CacheConfig,
    /// L1 data cache.
    #[serde(default = "CacheConfig::l1_data")]
    pub l1_d: CacheConfig,
    /// Shared levels, outermost last.
    #[serde(default = "CacheHierarchyConfig::default_levels")]
    pub levels: Vec<CacheConfig>,
}

impl CacheHierarchyConfig {
    fn default_levels() -> Vec<CacheConfig> {
        vec![CacheConfig::l2(), CacheConfig::l3()]
    }

    /// Number of cache levels including L1.
    pub fn depth(&self) -> u8 {
        u8::try_from(self.levels.len() + 1).unwrap_or(u8::MAX)
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            l1_i: CacheConfig::l1_instruction(),
            l1_d: CacheConfig::l1_data(),
            levels: Self::default_levels(),
        }
    }
}

/// Parameters of one cache, passed through to the leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Capacity (e.g. `"256kB"`).
    #[serde(default = "CacheConfig::default_size")]
    pub size: String,

    /// Associativity.
    #[serde(default = "CacheConfig::default_assoc")]
    pub assoc: usize,

    /// Tag lookup latency in cycles.
    #[serde(default = "CacheConfig::default_latency")]
    pub tag_latency: u64,

    /// Data array latency in cycles.
    #[serde(default = "CacheConfig::default_latency")]
    pub data_latency: u64,

    /// Latency to return a response upstream, in cycles.
    #[serde(default = "CacheConfig::default_latency")]
    pub response_latency: u64,

    /// Miss status holding registers.
    #[serde(default = "CacheConfig::default_mshrs")]
    pub mshrs: usize,

    /// Targets per MSHR.
    #[serde(default = "CacheConfig::default_tgts")]
    pub tgts_per_mshr: usize,

    /// Replacement policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    fn default_size() -> String {
        defaults::CACHE_SIZE.to_string()
    }

    fn default_assoc() -> usize {
        defaults::CACHE_ASSOC
    }

    fn default_latency() -> u64 {
        defaults::CACHE_LATENCY
    }

    fn default_mshrs() -> usize {
        defaults::CACHE_MSHRS
    }

    fn default_tgts() -> usize {
        defaults::CACHE_TGTS_PER_MSHR
    }

    fn sized(size: &str, assoc: usize, latency: u64, mshrs: usize, tgts_per_mshr: usize) -> Self {
        Self {
            size: size.to_string(),
            assoc,
            tag_latency: latency,
            data_latency: latency,
            response_latency: latency,
            mshrs,
            tgts_per_mshr,
            policy: ReplacementPolicy::default(),
        }
    }

    /// 16kB, 2-way L1 instruction cache.
    pub fn l1_instruction() -> Self {
        Self::sized("16kB", 2, 2, 4, 20)
    }

    /// 64kB, 2-way L1 data cache.
    pub fn l1_data() -> Self {
        Self::sized("64kB", 2, 2, 4, 20)
    }

    /// 256kB, 8-way L2.
    pub fn l2() -> Self {
        Self::sized("256kB", 8, 20, 20, 12)
    }

    /// 1MB, 16-way L3.
    pub fn l3() -> Self {
        Self::sized("1MB", 16, 40, 32, 12)
    }

    /// Capacity in bytes.
    pub fn size_bytes(&self) -> Result<u64, ConfigError> {
        parse_size(&self.size)
    }

    fn validate(&self, level: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidCache {
            level: level.to_string(),
            reason: reason.to_string(),
        };
        let size = self.size_bytes()?;
        if size == 0 {
            return Err(invalid("size must be positive"));
        }
        if self.assoc == 0 {
            return Err(invalid("associativity must be positive"));
        }
        if size < self.assoc as u64 * defaults::CACHE_LINE {
            return Err(invalid("every way must hold at least one line"));
        }
        if self.mshrs == 0 || self.tgts_per_mshr == 0 {
            return Err(invalid("mshrs and tgts_per_mshr must be positive"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::sized(
            defaults::CACHE_SIZE,
            defaults::CACHE_ASSOC,
            defaults::CACHE_LATENCY,
            defaults::CACHE_MSHRS,
            defaults::CACHE_TGTS_PER_MSHR,
        )
    }
}

/// Main memory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// DRAM interface of the memory controller.
    #[serde(default)]
    pub dram: DramInterface,
}

/// Workload record: binary plus argument vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Path of the binary the CPU executes.
    #[serde(default = "WorkloadConfig::default_binary")]
    pub binary: PathBuf,

    /// Arguments after the binary, in order. Integers and strings keep their type.
    #[serde(default)]
    pub args: Vec<WorkloadArg>,
}

impl WorkloadConfig {
    fn default_binary() -> PathBuf {
        PathBuf::from(defaults::BINARY)
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            args: Vec::new(),
        }
    }
}
