//! System graph arena.
//!
//! Components, ports and connections live in flat vectors and refer to each other by
//! stable indices (`ComponentId`, `PortId`), so the graph can be validated, compared and
//! serialized without chasing references. This module provides:
//! 1. **Construction:** Adding leaf components and connecting requestor/responder ports
//!    with the at-most-one-peer rule for single ports.
//! 2. **Validation:** Dangling mandatory ports (all of them), reachability from the
//!    system root, acyclicity of the memory hierarchy, and a path from every CPU to memory.
//! 3. **Inspection:** The frozen `FinalizedGraph` handed to the engine, with hierarchy
//!    traversal and JSON export.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::devices::INTERRUPT_TRIPLE;
use super::level::Tier;
use super::port::{Arity, PortId, PortKind, PortRole, PortSpec};
use super::traits::{ComponentKind, Leaf};
use crate::common::addr::AddrRange;
use crate::common::clock::{ClockDomain, VoltageDomain};
use crate::common::error::TopologyError;
use crate::config::MemMode;
use crate::sim::workload::Process;

/// Stable index of a component in the system graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ComponentId(pub(crate) usize);

impl ComponentId {
    /// Raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A named node with a fixed set of typed ports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Component {
    name: String,
    kind: ComponentKind,
    tier: Option<Tier>,
    parent: Option<ComponentId>,
    params: Value,
    ports: Vec<PortId>,
    workload_slots: usize,
    workload: Option<Process>,
    thread_contexts: usize,
    range: Option<AddrRange>,
}

impl Component {
    /// Full path, e.g. `system.cpu.icache`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component kind.
    pub const fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Hierarchy tier, if any.
    pub const fn tier(&self) -> Option<Tier> {
        self.tier
    }

    /// Owning component (interrupt controllers belong to their CPU).
    pub const fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    /// Opaque leaf parameters.
    pub const fn params(&self) -> &Value {
        &self.params
    }

    /// Ports in declaration order.
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// Hardware thread contexts a workload can occupy.
    pub const fn workload_slots(&self) -> usize {
        self.workload_slots
    }

    /// Workload attached to this CPU, if any.
    pub const fn workload(&self) -> Option<&Process> {
        self.workload.as_ref()
    }

    /// Number of thread contexts created for the workload.
    pub const fn thread_contexts(&self) -> usize {
        self.thread_contexts
    }

    /// Address range managed by this memory controller, once bound.
    pub const fn range(&self) -> Option<AddrRange> {
        self.range
    }
}

/// A typed endpoint on a component.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Port {
    owner: ComponentId,
    spec: PortSpec,
    peers: Vec<PortId>,
}

impl Port {
    /// Component exposing this port.
    pub const fn owner(&self) -> ComponentId {
        self.owner
    }

    /// Static description (role, kind, arity, mandatory).
    pub const fn spec(&self) -> PortSpec {
        self.spec
    }

    /// Connected peers; at most one for single ports.
    pub fn peers(&self) -> &[PortId] {
        &self.peers
    }

    /// Returns `true` if the port has at least one peer.
    pub fn is_connected(&self) -> bool {
        !self.peers.is_empty()
    }
}

/// An edge of the system graph, always requestor to responder.
///
/// The direction denotes hierarchy order (toward memory), not data direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Connection {
    /// Requesting end (toward the CPU).
    pub requestor: PortId,
    /// Responding end (toward memory).
    pub responder: PortId,
}

/// System-wide parameters set by `create_system`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemParams {
    /// Clock domain shared by every component.
    pub clk_domain: ClockDomain,
    /// Voltage domain of the clock domain.
    pub voltage_domain: VoltageDomain,
    /// Memory access mode.
    pub mem_mode: MemMode,
    /// Declared physical memory ranges.
    pub mem_ranges: Vec<AddrRange>,
}

/// Mutable arena of components, ports and connections.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SystemGraph {
    components: Vec<Component>,
    ports: Vec<Port>,
    connections: Vec<Connection>,
}

impl SystemGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if no component has been added.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Looks up a component.
    pub fn component(&self, id: ComponentId) -> Result<&Component, TopologyError> {
        self.components
            .get(id.0)
            .ok_or(TopologyError::UnknownComponent(id.0))
    }

    /// Looks up a port.
    pub fn port(&self, id: PortId) -> Result<&Port, TopologyError> {
        self.ports.get(id.0).ok_or(TopologyError::UnknownPortId(id.0))
    }

    /// All components with their ids, in creation order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, c)| (ComponentId(i), c))
    }

    /// All connections, in the order they were made (sorted once finalized).
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Finds a component by full path.
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.name == name)
            .map(ComponentId)
    }

    /// Full path of a port, e.g. `system.l2bus.mem_side_ports`.
    pub fn port_path(&self, id: PortId) -> String {
        self.ports.get(id.0).map_or_else(
            || format!("<port #{}>", id.0),
            |port| format!("{}.{}", self.components[port.owner.0].name, port.spec.role),
        )
    }

    /// The port playing `role` on `component`.
    pub fn port_of(&self, component: ComponentId, role: PortRole) -> Result<PortId, TopologyError> {
        let comp = self.component(component)?;
        comp.ports
            .iter()
            .copied()
            .find(|p| self.ports[p.0].spec.role == role)
            .ok_or_else(|| TopologyError::UnknownPort {
                component: comp.name.clone(),
                role: role.to_string(),
            })
    }

    /// Children of `parent` of the given kind.
    pub fn children(&self, parent: ComponentId, kind: ComponentKind) -> Vec<ComponentId> {
        self.components()
            .filter(|(_, c)| c.parent == Some(parent) && c.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Components of the given kind, in creation order.
    pub fn of_kind(&self, kind: ComponentKind) -> Vec<ComponentId> {
        self.components()
            .filter(|(_, c)| c.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Adds `leaf` as `name`, nested under `parent` when given.
    pub(crate) fn add_component(
        &mut self,
        name: &str,
        leaf: &dyn Leaf,
        parent: Option<ComponentId>,
    ) -> ComponentId {
        let name = match parent.and_then(|p| self.components.get(p.0)) {
            Some(owner) => format!("{}.{name}", owner.name),
            None => name.to_string(),
        };
        let id = ComponentId(self.components.len());
        let mut ports = Vec::with_capacity(leaf.ports().len());
        for spec in leaf.ports() {
            ports.push(PortId(self.ports.len()));
            self.ports.push(Port {
                owner: id,
                spec: *spec,
                peers: Vec::new(),
            });
        }
        debug!(component = %name, kind = %leaf.kind(), "created component");
        self.components.push(Component {
            name,
            kind: leaf.kind(),
            tier: leaf.tier(),
            parent,
            params: leaf.params(),
            ports,
            workload_slots: leaf.workload_slots(),
            workload: None,
            thread_contexts: 0,
            range: None,
        });
        id
    }

    /// Checks that `a` and `b` may be connected, without connecting them.
    ///
    /// # Returns
    ///
    /// The normalized connection, or a `TopologyError` if both ports have the same kind,
    /// a single port already has a peer, or the two ports are already connected.
    pub fn check_connection(&self, a: PortId, b: PortId) -> Result<Connection, TopologyError> {
        let kind_a = self.port(a)?.spec.kind;
        let kind_b = self.port(b)?.spec.kind;
        if kind_a == kind_b {
            return Err(TopologyError::IncompatiblePorts {
                from: self.port_path(a),
                to: self.port_path(b),
                kind: kind_a.to_string(),
            });
        }

        let (requestor, responder) = match kind_a {
            PortKind::Requestor => (a, b),
            PortKind::Responder => (b, a),
        };

        for (port, other) in [(requestor, responder), (responder, requestor)] {
            let p = &self.ports[port.0];
            if p.peers.contains(&other) {
                return Err(TopologyError::PortOccupied {
                    port: self.port_path(port),
                    peer: self.port_path(other),
                });
            }
            if let (Arity::Single, Some(&peer)) = (p.spec.arity, p.peers.first()) {
                return Err(TopologyError::PortOccupied {
                    port: self.port_path(port),
                    peer: self.port_path(peer),
                });
            }
        }

        Ok(Connection {
            requestor,
            responder,
        })
    }

    /// Connects two ports; the argument order does not matter.
    pub(crate) fn connect(&mut self, a: PortId, b: PortId) -> Result<Connection, TopologyError> {
        let connection = self.check_connection(a, b)?;
        self.ports[connection.requestor.0]
            .peers
            .push(connection.responder);
        self.ports[connection.responder.0]
            .peers
            .push(connection.requestor);
        self.connections.push(connection);
        debug!(
            requestor = %self.port_path(connection.requestor),
            responder = %self.port_path(connection.responder),
            "connected"
        );
        Ok(connection)
    }

    pub(crate) fn set_workload(
        &mut self,
        cpu: ComponentId,
        process: Process,
    ) -> Result<usize, TopologyError> {
        let comp = self
            .components
            .get_mut(cpu.0)
            .ok_or(TopologyError::UnknownComponent(cpu.0))?;
        if comp.workload.is_some() {
            return Err(TopologyError::WorkloadAlreadyAttached(comp.name.clone()));
        }
        comp.workload = Some(process);
        comp.thread_contexts = comp.workload_slots;
        Ok(comp.thread_contexts)
    }

    pub(crate) fn set_range(
        &mut self,
        controller: ComponentId,
        range: AddrRange,
    ) -> Result<(), TopologyError> {
        let comp = self
            .components
            .get_mut(controller.0)
            .ok_or(TopologyError::UnknownComponent(controller.0))?;
        comp.range = Some(range);
        Ok(())
    }

    /// Paths of the interrupt port triple for thread `thread` of `cpu`.
    pub(crate) fn interrupt_paths(&self, cpu: ComponentId, thread: usize) -> Vec<String> {
        INTERRUPT_TRIPLE
            .iter()
            .map(|role| format!("{}.interrupts[{thread}].{role}", self.components[cpu.0].name))
            .collect()
    }

    /// Every mandatory port, interrupt triple and workload slot left unconnected.
    pub fn dangling(&self) -> Vec<String> {
        let mut dangling = Vec::new();
        for (id, comp) in self.components() {
            for &port in &comp.ports {
                let p = &self.ports[port.0];
                if p.spec.mandatory && !p.is_connected() {
                    dangling.push(self.port_path(port));
                }
            }
            if comp.kind == ComponentKind::Cpu {
                let controllers = self.children(id, ComponentKind::InterruptController).len();
                for thread in controllers..comp.workload_slots {
                    dangling.extend(self.interrupt_paths(id, thread));
                }
                if comp.workload.is_none() {
                    dangling.push(format!("{}.workload", comp.name));
                }
            }
        }
        dangling
    }

    fn hierarchy_edges(&self) -> impl Iterator<Item = (ComponentId, ComponentId)> + '_ {
        self.connections
            .iter()
            .filter(|c| {
                !self.ports[c.requestor.0].spec.role.is_side_channel()
                    && !self.ports[c.responder.0].spec.role.is_side_channel()
            })
            .map(|c| (self.ports[c.requestor.0].owner, self.ports[c.responder.0].owner))
    }

    fn unreachable_from(&self, root: ComponentId) -> Vec<String> {
        let mut adjacency = vec![Vec::new(); self.components.len()];
        for c in &self.connections {
            let (a, b) = (self.ports[c.requestor.0].owner, self.ports[c.responder.0].owner);
            adjacency[a.0].push(b);
            adjacency[b.0].push(a);
        }

        let mut seen = vec![false; self.components.len()];
        let mut queue = VecDeque::from([root]);
        seen[root.0] = true;
        while let Some(id) = queue.pop_front() {
            for &next in &adjacency[id.0] {
                if !seen[next.0] {
                    seen[next.0] = true;
                    queue.push_back(next);
                }
            }
        }

        self.components()
            .filter(|(id, _)| !seen[id.0])
            .map(|(_, c)| c.name.clone())
            .collect()
    }

    fn cyclic_components(&self) -> Vec<String> {
        let n = self.components.len();
        let mut indegree = vec![0usize; n];
        let mut successors = vec![Vec::new(); n];
        for (from, to) in self.hierarchy_edges() {
            successors[from.0].push(to);
            indegree[to.0] += 1;
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut removed = vec![false; n];
        while let Some(i) = queue.pop_front() {
            removed[i] = true;
            for next in &successors[i] {
                indegree[next.0] -= 1;
                if indegree[next.0] == 0 {
                    queue.push_back(next.0);
                }
            }
        }

        self.components()
            .filter(|(id, _)| !removed[id.0])
            .map(|(_, c)| c.name.clone())
            .collect()
    }

    fn reaches_memory(&self, from: ComponentId) -> bool {
        let mut successors = vec![Vec::new(); self.components.len()];
        for (a, b) in self.hierarchy_edges() {
            successors[a.0].push(b);
        }
        let mut seen = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(id) = queue.pop_front() {
            if self.components[id.0].kind == ComponentKind::MemCtrl {
                return true;
            }
            for &next in &successors[id.0] {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Runs every finalization check against `root`.
    ///
    /// Checks run in order: dangling mandatory ports (all reported together),
    /// reachability from the root, acyclicity of the hierarchy, then a path from each CPU
    /// to a memory controller.
    pub fn validate(&self, root: ComponentId) -> Result<(), TopologyError> {
        let _ = self.component(root)?;

        let ports = self.dangling();
        if !ports.is_empty() {
            return Err(TopologyError::Unconnected { ports });
        }

        let components = self.unreachable_from(root);
        if !components.is_empty() {
            return Err(TopologyError::Disconnected { components });
        }

        let components = self.cyclic_components();
        if !components.is_empty() {
            return Err(TopologyError::Cycle { components });
        }

        for cpu in self.of_kind(ComponentKind::Cpu) {
            if !self.reaches_memory(cpu) {
                return Err(TopologyError::NoPathToMemory {
                    from: self.components[cpu.0].name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Puts connections and peer lists in a canonical order.
    ///
    /// Two graphs built by issuing independent wiring calls in different orders compare
    /// equal afterwards.
    pub(crate) fn canonicalize(&mut self) {
        self.connections.sort_unstable();
        for port in &mut self.ports {
            port.peers.sort_unstable();
        }
    }

    /// Tiers met when following hierarchy edges down from the requestor port `start`.
    ///
    /// Crossbars are transparent; caches contribute their tier and the walk ends at the
    /// first memory controller, which contributes `Tier::Memory`.
    pub fn hierarchy_from(&self, start: PortId) -> Vec<Tier> {
        let mut tiers = Vec::new();
        let mut port = start;
        for _ in 0..=self.components.len() {
            let Some(next) = self.ports.get(port.0).and_then(|p| {
                p.peers
                    .iter()
                    .copied()
                    .find(|peer| !self.ports[peer.0].spec.role.is_side_channel())
            }) else {
                break;
            };
            let owner = self.ports[next.0].owner;
            let comp = &self.components[owner.0];
            let down = match comp.kind {
                ComponentKind::Cache => {
                    tiers.extend(comp.tier);
                    self.port_of(owner, PortRole::MemSide)
                }
                ComponentKind::Crossbar => self.port_of(owner, PortRole::MemSidePorts),
                ComponentKind::MemCtrl => {
                    tiers.push(Tier::Memory);
                    break;
                }
                _ => break,
            };
            match down {
                Ok(p) => port = p,
                Err(_) => break,
            }
        }
        tiers
    }
}

/// A validated, frozen system graph.
///
/// Only [`crate::soc::builder::TopologyAssembler::finalize`] creates one, so holding a
/// `FinalizedGraph` proves every finalization invariant held.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinalizedGraph {
    system: SystemParams,
    root: ComponentId,
    graph: SystemGraph,
}

impl FinalizedGraph {
    pub(crate) const fn new(system: SystemParams, root: ComponentId, graph: SystemGraph) -> Self {
        Self {
            system,
            root,
            graph,
        }
    }

    /// System-wide parameters.
    pub const fn system(&self) -> &SystemParams {
        &self.system
    }

    /// The system root component.
    pub const fn root(&self) -> ComponentId {
        self.root
    }

    /// Read-only view of the underlying arena.
    pub const fn graph(&self) -> &SystemGraph {
        &self.graph
    }

    /// All CPUs.
    pub fn cpus(&self) -> Vec<ComponentId> {
        self.graph.of_kind(ComponentKind::Cpu)
    }

    /// All memory controllers.
    pub fn memory_controllers(&self) -> Vec<ComponentId> {
        self.graph.of_kind(ComponentKind::MemCtrl)
    }

    /// Tiers on the data path of `cpu`, from L1 to memory.
    pub fn hierarchy(&self, cpu: ComponentId) -> Result<Vec<Tier>, TopologyError> {
        let port = self.graph.port_of(cpu, PortRole::DcachePort)?;
        Ok(self.graph.hierarchy_from(port))
    }

    /// Tiers on the instruction-fetch path of `cpu`, from L1 to memory.
    pub fn instruction_hierarchy(&self, cpu: ComponentId) -> Result<Vec<Tier>, TopologyError> {
        let port = self.graph.port_of(cpu, PortRole::IcachePort)?;
        Ok(self.graph.hierarchy_from(port))
    }

    /// Serializes the whole graph as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
