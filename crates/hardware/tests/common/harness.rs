use std::path::{Path, PathBuf};

use memhier_core::config::{CacheConfig, Config};
use memhier_core::sim::{Process, WorkloadArg};
use memhier_core::soc::builder::SystemHandles;
use memhier_core::soc::{FinalizedGraph, PortRole, Tier, TopologyAssembler};
use tracing_subscriber::EnvFilter;

/// ELF machine number for x86-64.
pub const EM_X86_64: u16 = 0x3e;
/// ELF machine number for AArch64.
pub const EM_AARCH64: u16 = 0xb7;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Default configuration with a trivial workload.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.workload.binary = PathBuf::from("hello");
    config
}

/// Configuration with `shared` cache levels below L1.
pub fn config_with_levels(shared: usize) -> Config {
    let mut config = test_config();
    config.cache.levels = (0..shared).map(|_| CacheConfig::l2()).collect();
    config
}

/// The argument vector of the classic benchmark invocation.
pub fn benchmark_args() -> Vec<WorkloadArg> {
    vec![
        "-ns".into(),
        16.into(),
        "-sm".into(),
        5000.into(),
        "-nt".into(),
        8.into(),
    ]
}

/// Assembler driven one step at a time.
#[derive(Debug)]
pub struct Staged {
    /// The assembler under test.
    pub asm: TopologyAssembler,
    /// Handles returned by `create_system`.
    pub sys: SystemHandles,
    config: Config,
}

impl Staged {
    /// Creates the system for `config`.
    pub fn new(config: &Config) -> Self {
        init_tracing();
        let mut asm = TopologyAssembler::new();
        let sys = asm.create_system(config).unwrap();
        Self {
            asm,
            sys,
            config: config.clone(),
        }
    }

    /// Attaches both L1 caches below the CPU.
    pub fn l1(&mut self) {
        let bus = self.sys.l1_bus();
        let icache_port = self.asm.port(self.sys.cpu, PortRole::IcachePort).unwrap();
        let dcache_port = self.asm.port(self.sys.cpu, PortRole::DcachePort).unwrap();
        self.asm
            .attach_cache(Tier::L1, self.sys.icache, icache_port, bus)
            .unwrap();
        self.asm
            .attach_cache(Tier::L1, self.sys.dcache, dcache_port, bus)
            .unwrap();
    }

    /// Chains shared level `index` (0 is L2) between its bus and the next one.
    pub fn level(&mut self, index: usize) {
        let level = self.sys.levels[index];
        let upper = self
            .sys
            .levels
            .get(index + 1)
            .map_or(self.sys.membus, |next| next.bus);
        self.asm.chain_level(level.bus, level.cache, upper).unwrap();
    }

    /// Chains every shared level, L2 first.
    pub fn levels(&mut self) {
        for index in 0..self.sys.levels.len() {
            self.level(index);
        }
    }

    /// Creates the interrupt controllers and wires them to the memory bus.
    pub fn interrupts(&mut self) {
        let _ = self.asm.create_interrupt_controller(self.sys.cpu).unwrap();
        self.asm
            .wire_interrupts(self.sys.cpu, self.sys.membus)
            .unwrap();
    }

    /// Connects the system port to the memory bus.
    pub fn system_port(&mut self) {
        self.asm.attach_system_port(self.sys.membus).unwrap();
    }

    /// Attaches the DRAM controller over the whole memory range.
    pub fn memory(&mut self) {
        self.asm
            .attach_memory_controller(self.sys.membus, self.sys.mem_ctrl, self.sys.mem_range)
            .unwrap();
    }

    /// Attaches the configured workload.
    pub fn workload(&mut self) {
        let process = Process::from_config(&self.config.workload);
        self.asm.attach_workload(self.sys.cpu, process).unwrap();
    }

    /// Runs every step in the canonical order.
    pub fn wire_all(&mut self) {
        self.l1();
        self.levels();
        self.interrupts();
        self.system_port();
        self.memory();
        self.workload();
    }

    /// Finalizes the graph.
    pub fn finalize(&mut self) -> FinalizedGraph {
        self.asm.finalize().unwrap()
    }
}

/// A minimal ELF64 little-endian executable header for `machine`.
pub fn elf_header(machine: u16, entry: u64) -> Vec<u8> {
    let mut elf = Vec::with_capacity(64);
    elf.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    elf.extend_from_slice(&[0; 8]);
    elf.extend_from_slice(&2u16.to_le_bytes());
    elf.extend_from_slice(&machine.to_le_bytes());
    elf.extend_from_slice(&1u32.to_le_bytes());
    elf.extend_from_slice(&entry.to_le_bytes());
    elf.extend_from_slice(&0u64.to_le_bytes());
    elf.extend_from_slice(&0u64.to_le_bytes());
    elf.extend_from_slice(&0u32.to_le_bytes());
    elf.extend_from_slice(&64u16.to_le_bytes());
    elf.extend_from_slice(&56u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    elf.extend_from_slice(&64u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    elf
}

/// Writes `bytes` to `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
