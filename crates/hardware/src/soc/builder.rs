//! Topology assembler and the canonical system build.
//!
//! This module turns a validated configuration into a frozen system graph. It performs:
//! 1. **Allocation:** `create_system` places the system root, CPU, split L1 caches, one
//!    crossbar plus one cache per shared level, the memory crossbar and a DRAM controller.
//! 2. **Wiring:** `attach_cache`, `chain_level`, `wire_interrupts`, `attach_system_port`,
//!    `attach_memory_controller` and `attach_workload` add edges with level-order checks.
//! 3. **Finalization:** `finalize` validates the whole graph and freezes it.
//!
//! Every operation checks its preconditions before touching the graph, so a failing call
//! leaves the assembler exactly as it was.

use serde_json::{Value, json};
use tracing::info;

use super::cache::Cache;
use super::cpu::Cpu;
use super::devices::InterruptController;
use super::graph::{ComponentId, FinalizedGraph, SystemGraph, SystemParams};
use super::interconnect::Crossbar;
use super::level::Tier;
use super::memory::MemCtrl;
use super::port::{PortId, PortRole, PortSpec};
use super::traits::{ComponentKind, Leaf};
use crate::common::addr::AddrRange;
use crate::common::error::{ConfigError, Result, TopologyError, UsageError};
use crate::config::{Config, DramInterface, Isa};
use crate::sim::simulator::Phase;
use crate::sim::workload::Process;

const ROOT_PORTS: &[PortSpec] = &[PortSpec::requestor(PortRole::SystemPort)];

/// The system root: owns the functional system port and the system-wide parameters.
#[derive(Debug, Clone)]
pub struct SystemRoot {
    params: SystemParams,
}

impl Leaf for SystemRoot {
    fn kind(&self) -> ComponentKind {
        ComponentKind::System
    }

    fn ports(&self) -> &'static [PortSpec] {
        ROOT_PORTS
    }

    fn params(&self) -> Value {
        json!({
            "type": "System",
            "clk_domain": self.params.clk_domain,
            "voltage_domain": self.params.voltage_domain,
            "mem_mode": self.params.mem_mode,
            "mem_ranges": self.params.mem_ranges,
        })
    }
}

/// Crossbar and cache making up one shared level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelHandles {
    /// Crossbar on the CPU side of the cache.
    pub bus: ComponentId,
    /// The shared cache.
    pub cache: ComponentId,
}

/// Components allocated by [`TopologyAssembler::create_system`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemHandles {
    /// System root.
    pub root: ComponentId,
    /// The CPU.
    pub cpu: ComponentId,
    /// L1 instruction cache.
    pub icache: ComponentId,
    /// L1 data cache.
    pub dcache: ComponentId,
    /// Shared levels, L2 first.
    pub levels: Vec<LevelHandles>,
    /// Memory crossbar.
    pub membus: ComponentId,
    /// DRAM controller.
    pub mem_ctrl: ComponentId,
    /// Declared physical memory range.
    pub mem_range: AddrRange,
}

impl SystemHandles {
    /// Crossbar the L1 caches feed: the first shared level's, or the memory crossbar.
    pub fn l1_bus(&self) -> ComponentId {
        self.levels.first().map_or(self.membus, |level| level.bus)
    }
}

/// Single owner of the system graph while it is being assembled.
#[derive(Debug)]
pub struct TopologyAssembler {
    phase: Phase,
    graph: SystemGraph,
    system: Option<SystemParams>,
    root: Option<ComponentId>,
    isa: Isa,
    depth: u8,
}

impl Default for TopologyAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyAssembler {
    /// Creates an assembler with no system.
    pub fn new() -> Self {
        Self {
            phase: Phase::Unbuilt,
            graph: SystemGraph::new(),
            system: None,
            root: None,
            isa: Isa::default(),
            depth: 1,
        }
    }

    /// Current lifecycle phase (`Unbuilt`, `Assembling` or `Finalized`).
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The graph under construction.
    pub const fn graph(&self) -> &SystemGraph {
        &self.graph
    }

    fn ensure_assembling(&self) -> Result<()> {
        match self.phase {
            Phase::Unbuilt => Err(UsageError::SystemNotCreated.into()),
            Phase::Assembling => Ok(()),
            _ => Err(UsageError::GraphFrozen.into()),
        }
    }

    fn expect_kind(&self, id: ComponentId, kind: ComponentKind) -> Result<()> {
        let comp = self.graph.component(id)?;
        if comp.kind() != kind {
            return Err(TopologyError::WrongKind {
                component: comp.name().to_string(),
                expected: kind.to_string(),
                found: comp.kind().to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn tier_of(&self, id: ComponentId) -> Result<Tier> {
        let comp = self.graph.component(id)?;
        comp.tier().ok_or_else(|| {
            TopologyError::WrongKind {
                component: comp.name().to_string(),
                expected: "hierarchy member".to_string(),
                found: comp.kind().to_string(),
            }
            .into()
        })
    }

    /// Requires `upper` to sit exactly one tier below `tier`.
    fn check_order(&self, component: ComponentId, tier: Tier, upper: ComponentId) -> Result<()> {
        let upper_tier = self.tier_of(upper)?;
        if upper_tier != tier.next(self.depth) {
            return Err(TopologyError::LevelOrder {
                component: self.graph.component(component)?.name().to_string(),
                tier: tier.to_string(),
                upper: self.graph.component(upper)?.name().to_string(),
                upper_tier: upper_tier.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn add(&mut self, name: &str, leaf: &dyn Leaf, parent: Option<ComponentId>) -> ComponentId {
        self.graph.add_component(name, leaf, parent)
    }

    /// Validates `config` and allocates every component of the system.
    ///
    /// Configuration is validated before anything is constructed, so a bad option leaves
    /// the assembler `Unbuilt`.
    ///
    /// # Arguments
    ///
    /// * `config` - Clock, voltage, memory range, CPU, cache levels and DRAM interface.
    ///
    /// # Returns
    ///
    /// Handles to the allocated components, or a `ConfigError` / `UsageError`.
    pub fn create_system(&mut self, config: &Config) -> Result<SystemHandles> {
        if self.phase != Phase::Unbuilt {
            return Err(UsageError::SystemAlreadyCreated.into());
        }
        config.validate()?;
        let mem_range = config.system.mem_range()?;
        let params = SystemParams {
            clk_domain: config.system.clock_domain()?,
            voltage_domain: config.system.voltage_domain()?,
            mem_mode: config.system.mem_mode,
            mem_ranges: vec![mem_range],
        };

        let numbers = (2..config.cache.levels.len() + 2)
            .map(|n| {
                u8::try_from(n).map_err(|_| ConfigError::InvalidCache {
                    level: format!("L{n}"),
                    reason: "too many cache levels".to_string(),
                })
            })
            .collect::<std::result::Result<Vec<u8>, _>>()?;

        self.isa = config.cpu.isa;
        self.depth = config.cache.depth();

        let root = self.add(
            "system",
            &SystemRoot {
                params: params.clone(),
            },
            None,
        );
        let cpu = self.add("cpu", &Cpu::new(config.cpu.clone()), Some(root));
        let icache = self.add(
            "icache",
            &Cache::l1_instruction(config.cache.l1_i.clone()),
            Some(cpu),
        );
        let dcache = self.add(
            "dcache",
            &Cache::l1_data(config.cache.l1_d.clone()),
            Some(cpu),
        );

        let mut levels = Vec::with_capacity(config.cache.levels.len());
        for (&level, cache_config) in numbers.iter().zip(&config.cache.levels) {
            let xbar = Crossbar::new(Tier::Cache(level));
            let bus = self.add(&xbar.instance_name(), &xbar, Some(root));
            let cache = self.add(
                &format!("l{level}cache"),
                &Cache::unified(level, cache_config.clone()),
                Some(root),
            );
            levels.push(LevelHandles { bus, cache });
        }

        let xbar = Crossbar::new(Tier::Memory);
        let membus = self.add(&xbar.instance_name(), &xbar, Some(root));
        let mem_ctrl = self.add("mem_ctrl", &MemCtrl::new(config.memory.dram), Some(root));

        self.system = Some(params);
        self.root = Some(root);
        self.phase = Phase::Assembling;
        info!(
            components = self.graph.len(),
            levels = self.depth,
            mem_range = %mem_range,
            "system created"
        );

        Ok(SystemHandles {
            root,
            cpu,
            icache,
            dcache,
            levels,
            membus,
            mem_ctrl,
            mem_range,
        })
    }

    /// The port playing `role` on `component`.
    pub fn port(&self, component: ComponentId, role: PortRole) -> Result<PortId> {
        Ok(self.graph.port_of(component, role)?)
    }

    /// Connects two ports directly, without hierarchy-order checks.
    ///
    /// Finalization still validates the resulting graph.
    pub fn connect(&mut self, a: PortId, b: PortId) -> Result<()> {
        self.ensure_assembling()?;
        let _ = self.graph.connect(a, b)?;
        Ok(())
    }

    /// Allocates an extra crossbar for `tier`, named `name` under the system root.
    pub fn add_crossbar(&mut self, name: &str, tier: Tier) -> Result<ComponentId> {
        self.ensure_assembling()?;
        let root = self.root.ok_or(UsageError::SystemNotCreated)?;
        Ok(self.add(name, &Crossbar::new(tier), Some(root)))
    }

    /// Allocates an extra memory controller for a multi-range system.
    ///
    /// Controllers are named `mem_ctrl1`, `mem_ctrl2`, ... after the first.
    pub fn add_memory_controller(&mut self, dram: DramInterface) -> Result<ComponentId> {
        self.ensure_assembling()?;
        let root = self.root.ok_or(UsageError::SystemNotCreated)?;
        let index = self.graph.of_kind(ComponentKind::MemCtrl).len();
        Ok(self.add(&format!("mem_ctrl{index}"), &MemCtrl::new(dram), Some(root)))
    }

    /// Connects `cache` below `upstream` and feeds its memory side into `bus`.
    ///
    /// # Arguments
    ///
    /// * `level` - Tier the cache must sit at.
    /// * `cache` - The cache component.
    /// * `upstream` - Requestor port on the CPU side (e.g. the CPU's `icache_port`).
    /// * `bus` - Crossbar of the next tier down.
    pub fn attach_cache(
        &mut self,
        level: Tier,
        cache: ComponentId,
        upstream: PortId,
        bus: ComponentId,
    ) -> Result<()> {
        self.ensure_assembling()?;
        self.expect_kind(cache, ComponentKind::Cache)?;
        self.expect_kind(bus, ComponentKind::Crossbar)?;
        let tier = self.tier_of(cache)?;
        if tier != level {
            return Err(TopologyError::WrongKind {
                component: self.graph.component(cache)?.name().to_string(),
                expected: format!("{level} cache"),
                found: format!("{tier} cache"),
            }
            .into());
        }
        self.check_order(cache, tier, bus)?;

        let cpu_side = self.graph.port_of(cache, PortRole::CpuSide)?;
        let mem_side = self.graph.port_of(cache, PortRole::MemSide)?;
        let bus_side = self.graph.port_of(bus, PortRole::CpuSidePorts)?;
        let _ = self.graph.check_connection(upstream, cpu_side)?;
        let _ = self.graph.check_connection(mem_side, bus_side)?;

        let _ = self.graph.connect(upstream, cpu_side)?;
        let _ = self.graph.connect(mem_side, bus_side)?;
        Ok(())
    }

    /// Wires `cache` between two crossbars.
    ///
    /// `lower_bus.mem_side_ports` feeds `cache.cpu_side`, and `cache.mem_side` feeds
    /// `upper_bus.cpu_side_ports`. Adding a cache level is one call of this per level.
    pub fn chain_level(
        &mut self,
        lower_bus: ComponentId,
        cache: ComponentId,
        upper_bus: ComponentId,
    ) -> Result<()> {
        self.ensure_assembling()?;
        self.expect_kind(lower_bus, ComponentKind::Crossbar)?;
        self.expect_kind(cache, ComponentKind::Cache)?;
        self.expect_kind(upper_bus, ComponentKind::Crossbar)?;

        let tier = self.tier_of(cache)?;
        let lower_tier = self.tier_of(lower_bus)?;
        if lower_tier != tier {
            return Err(TopologyError::LevelOrder {
                component: self.graph.component(lower_bus)?.name().to_string(),
                tier: lower_tier.to_string(),
                upper: self.graph.component(cache)?.name().to_string(),
                upper_tier: tier.to_string(),
            }
            .into());
        }
        self.check_order(cache, tier, upper_bus)?;

        let feed = self.graph.port_of(lower_bus, PortRole::MemSidePorts)?;
        let cpu_side = self.graph.port_of(cache, PortRole::CpuSide)?;
        let mem_side = self.graph.port_of(cache, PortRole::MemSide)?;
        let upper = self.graph.port_of(upper_bus, PortRole::CpuSidePorts)?;
        let _ = self.graph.check_connection(feed, cpu_side)?;
        let _ = self.graph.check_connection(mem_side, upper)?;

        let _ = self.graph.connect(feed, cpu_side)?;
        let _ = self.graph.connect(mem_side, upper)?;
        Ok(())
    }

    /// Creates one interrupt controller per hardware thread of `cpu`.
    ///
    /// # Returns
    ///
    /// The controllers, named `<cpu>.interrupts[i]`.
    pub fn create_interrupt_controller(&mut self, cpu: ComponentId) -> Result<Vec<ComponentId>> {
        self.ensure_assembling()?;
        self.expect_kind(cpu, ComponentKind::Cpu)?;
        let existing = self
            .graph
            .children(cpu, ComponentKind::InterruptController)
            .len();
        let slots = self.graph.component(cpu)?.workload_slots();
        let mut created = Vec::with_capacity(slots.saturating_sub(existing));
        for thread in existing..slots {
            let controller = InterruptController::new(self.isa, thread);
            created.push(self.add(&format!("interrupts[{thread}]"), &controller, Some(cpu)));
        }
        Ok(created)
    }

    /// Connects the interrupt port triple of every controller of `cpu` to `membus`.
    ///
    /// `membus.mem_side_ports` feeds `pio` and `int_responder`; `int_requestor` feeds
    /// `membus.cpu_side_ports`.
    ///
    /// # Returns
    ///
    /// `TopologyError::MissingInterruptController` listing the unconnected triple if
    /// `create_interrupt_controller` was not called first.
    pub fn wire_interrupts(&mut self, cpu: ComponentId, membus: ComponentId) -> Result<()> {
        self.ensure_assembling()?;
        self.expect_kind(cpu, ComponentKind::Cpu)?;
        self.expect_kind(membus, ComponentKind::Crossbar)?;

        let controllers = self.graph.children(cpu, ComponentKind::InterruptController);
        if controllers.is_empty() {
            let slots = self.graph.component(cpu)?.workload_slots().max(1);
            return Err(TopologyError::MissingInterruptController {
                cpu: self.graph.component(cpu)?.name().to_string(),
                unconnected: (0..slots)
                    .flat_map(|thread| self.graph.interrupt_paths(cpu, thread))
                    .collect(),
            }
            .into());
        }

        let requests = self.graph.port_of(membus, PortRole::MemSidePorts)?;
        let responses = self.graph.port_of(membus, PortRole::CpuSidePorts)?;
        let mut pairs = Vec::with_capacity(controllers.len() * 3);
        for &controller in &controllers {
            pairs.push((requests, self.graph.port_of(controller, PortRole::Pio)?));
            pairs.push((
                self.graph.port_of(controller, PortRole::IntRequestor)?,
                responses,
            ));
            pairs.push((
                requests,
                self.graph.port_of(controller, PortRole::IntResponder)?,
            ));
        }
        for &(a, b) in &pairs {
            let _ = self.graph.check_connection(a, b)?;
        }
        for (a, b) in pairs {
            let _ = self.graph.connect(a, b)?;
        }
        Ok(())
    }

    /// Connects the system root's `system_port` to `bus`.
    pub fn attach_system_port(&mut self, bus: ComponentId) -> Result<()> {
        self.ensure_assembling()?;
        self.expect_kind(bus, ComponentKind::Crossbar)?;
        let root = self.root.ok_or(UsageError::SystemNotCreated)?;
        let system_port = self.graph.port_of(root, PortRole::SystemPort)?;
        let bus_side = self.graph.port_of(bus, PortRole::CpuSidePorts)?;
        let _ = self.graph.connect(system_port, bus_side)?;
        Ok(())
    }

    /// Binds `controller` to `range` and connects it below the memory crossbar `bus`.
    ///
    /// # Returns
    ///
    /// `ConfigError::RangeOutsideSystem` if `range` is not inside a declared memory range,
    /// `ConfigError::OverlappingRanges` if another controller already manages part of it.
    pub fn attach_memory_controller(
        &mut self,
        bus: ComponentId,
        controller: ComponentId,
        range: AddrRange,
    ) -> Result<()> {
        self.ensure_assembling()?;
        self.expect_kind(bus, ComponentKind::Crossbar)?;
        self.expect_kind(controller, ComponentKind::MemCtrl)?;
        let bus_tier = self.tier_of(bus)?;
        if bus_tier != Tier::Memory {
            return Err(TopologyError::LevelOrder {
                component: self.graph.component(controller)?.name().to_string(),
                tier: Tier::Memory.to_string(),
                upper: self.graph.component(bus)?.name().to_string(),
                upper_tier: bus_tier.to_string(),
            }
            .into());
        }

        let name = self.graph.component(controller)?.name().to_string();
        if range.is_empty() {
            return Err(ConfigError::EmptyAddressRange(range.to_string()).into());
        }
        let declared = self.system.as_ref().map_or(&[][..], |s| &s.mem_ranges[..]);
        if !declared.iter().any(|r| r.contains_range(&range)) {
            return Err(ConfigError::RangeOutsideSystem {
                controller: name,
                range: range.to_string(),
            }
            .into());
        }
        for (id, other) in self.graph.components() {
            if id != controller && other.range().is_some_and(|taken| taken.overlaps(&range)) {
                return Err(ConfigError::OverlappingRanges {
                    controller: name,
                    range: range.to_string(),
                    other: other.name().to_string(),
                }
                .into());
            }
        }

        let feed = self.graph.port_of(bus, PortRole::MemSidePorts)?;
        let port = self.graph.port_of(controller, PortRole::Port)?;
        let _ = self.graph.check_connection(feed, port)?;
        let _ = self.graph.connect(feed, port)?;
        self.graph.set_range(controller, range)?;
        Ok(())
    }

    /// Binds `process` to `cpu` and creates one thread context per hardware thread.
    pub fn attach_workload(&mut self, cpu: ComponentId, process: Process) -> Result<()> {
        self.ensure_assembling()?;
        self.expect_kind(cpu, ComponentKind::Cpu)?;
        let executable = process.executable().display().to_string();
        let threads = self.graph.set_workload(cpu, process)?;
        info!(executable = %executable, threads, "workload attached");
        Ok(())
    }

    /// Validates the graph and freezes it.
    ///
    /// On failure the assembler stays in `Assembling`, so the caller may fix the graph and
    /// finalize again.
    ///
    /// # Returns
    ///
    /// The frozen graph, or a `TopologyError` (e.g. `Unconnected` listing every dangling
    /// mandatory port).
    pub fn finalize(&mut self) -> Result<FinalizedGraph> {
        self.ensure_assembling()?;
        let root = self.root.ok_or(UsageError::SystemNotCreated)?;
        let system = self.system.clone().ok_or(UsageError::SystemNotCreated)?;
        self.graph.validate(root)?;

        let mut graph = std::mem::take(&mut self.graph);
        graph.canonicalize();
        self.phase = Phase::Finalized;
        info!(
            components = graph.len(),
            connections = graph.connections().len(),
            "graph finalized"
        );
        Ok(FinalizedGraph::new(system, root, graph))
    }
}

/// Assembles and finalizes the system described by `config`.
///
/// Runs the canonical sequence: L1 caches below the CPU, one `chain_level` per shared
/// level, interrupt controllers, system port, DRAM controller, then the workload.
///
/// # Arguments
///
/// * `config` - Full configuration, including the workload.
///
/// # Returns
///
/// The frozen graph ready for [`crate::sim::Simulation::new`].
pub fn build_system(config: &Config) -> Result<FinalizedGraph> {
    let mut asm = TopologyAssembler::new();
    let sys = asm.create_system(config)?;

    let l1_bus = sys.l1_bus();
    let icache_port = asm.port(sys.cpu, PortRole::IcachePort)?;
    let dcache_port = asm.port(sys.cpu, PortRole::DcachePort)?;
    asm.attach_cache(Tier::L1, sys.icache, icache_port, l1_bus)?;
    asm.attach_cache(Tier::L1, sys.dcache, dcache_port, l1_bus)?;

    for (i, level) in sys.levels.iter().enumerate() {
        let upper = sys.levels.get(i + 1).map_or(sys.membus, |next| next.bus);
        asm.chain_level(level.bus, level.cache, upper)?;
    }

    let _ = asm.create_interrupt_controller(sys.cpu)?;
    asm.wire_interrupts(sys.cpu, sys.membus)?;
    asm.attach_system_port(sys.membus)?;
    asm.attach_memory_controller(sys.membus, sys.mem_ctrl, sys.mem_range)?;
    asm.attach_workload(sys.cpu, Process::from_config(&config.workload))?;

    asm.finalize()
}
