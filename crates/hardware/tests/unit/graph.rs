//! # System Graph Tests
//!
//! Tests for port connection rules and for every finalization check: dangling mandatory
//! ports, reachability from the root, acyclicity and the path from CPU to memory.

use memhier_core::sim::Process;
use memhier_core::soc::graph::Connection;
use memhier_core::soc::port::{Arity, PortKind};
use memhier_core::soc::{ComponentId, PortRole, Tier, TopologyAssembler};
use memhier_core::{SimError, TopologyError};
use pretty_assertions::assert_eq;

use crate::common::harness::{Staged, config_with_levels, test_config};

fn topology(err: SimError) -> TopologyError {
    match err {
        SimError::Topology(e) => e,
        other => panic!("expected a topology error, got {other:?}"),
    }
}

#[test]
fn test_finalize_reports_every_dangling_port() {
    let mut staged = Staged::new(&test_config());
    let err = topology(staged.asm.finalize().unwrap_err());

    let expected = vec![
        "system.system_port",
        "system.cpu.icache_port",
        "system.cpu.dcache_port",
        "system.cpu.interrupts[0].pio",
        "system.cpu.interrupts[0].int_requestor",
        "system.cpu.interrupts[0].int_responder",
        "system.cpu.workload",
        "system.cpu.icache.cpu_side",
        "system.cpu.icache.mem_side",
        "system.cpu.dcache.cpu_side",
        "system.cpu.dcache.mem_side",
        "system.l2bus.cpu_side_ports",
        "system.l2bus.mem_side_ports",
        "system.l2cache.cpu_side",
        "system.l2cache.mem_side",
        "system.l3bus.cpu_side_ports",
        "system.l3bus.mem_side_ports",
        "system.l3cache.cpu_side",
        "system.l3cache.mem_side",
        "system.membus.cpu_side_ports",
        "system.membus.mem_side_ports",
        "system.mem_ctrl.port",
    ];
    assert_eq!(
        err,
        TopologyError::Unconnected {
            ports: expected.into_iter().map(String::from).collect(),
        }
    );
}

#[test]
fn test_finalize_reports_only_remaining_ports() {
    let mut staged = Staged::new(&test_config());
    staged.l1();
    staged.levels();
    staged.interrupts();
    staged.system_port();

    let err = topology(staged.asm.finalize().unwrap_err());
    assert_eq!(
        err,
        TopologyError::Unconnected {
            ports: vec![
                "system.cpu.workload".to_string(),
                "system.mem_ctrl.port".to_string(),
            ],
        }
    );
}

#[test]
fn test_failed_finalize_can_be_retried() {
    let mut staged = Staged::new(&test_config());
    staged.l1();
    staged.levels();
    staged.interrupts();
    staged.system_port();
    staged.memory();
    assert!(staged.asm.finalize().is_err());

    staged.workload();
    let graph = staged.finalize();
    assert_eq!(graph.cpus().len(), 1);
}

#[test]
fn test_no_port_has_two_peers_on_a_single_role() {
    let mut staged = Staged::new(&test_config());
    staged.wire_all();
    let graph = staged.finalize();

    for (_, comp) in graph.graph().components() {
        for &port in comp.ports() {
            let port = graph.graph().port(port).unwrap();
            match port.spec().arity {
                Arity::Single => assert_eq!(port.peers().len(), 1),
                Arity::Vector => assert!(!port.peers().is_empty()),
            }
        }
    }
}

#[test]
fn test_connections_run_requestor_to_responder() {
    let mut staged = Staged::new(&test_config());
    staged.wire_all();
    let graph = staged.finalize();

    for &Connection {
        requestor,
        responder,
    } in graph.graph().connections()
    {
        let g = graph.graph();
        assert_eq!(g.port(requestor).unwrap().spec().kind, PortKind::Requestor);
        assert_eq!(g.port(responder).unwrap().spec().kind, PortKind::Responder);
    }
}

#[test]
fn test_double_connection_rejected() {
    let mut staged = Staged::new(&test_config());
    staged.l1();
    let before = staged.asm.graph().connections().len();

    let icache_port = staged.asm.port(staged.sys.cpu, PortRole::IcachePort).unwrap();
    let err = topology(
        staged
            .asm
            .attach_cache(Tier::L1, staged.sys.icache, icache_port, staged.sys.l1_bus())
            .unwrap_err(),
    );
    assert!(matches!(err, TopologyError::PortOccupied { .. }));
    assert_eq!(staged.asm.graph().connections().len(), before);
}

#[test]
fn test_duplicate_vector_pair_rejected() {
    let mut staged = Staged::new(&test_config());
    let l2 = staged.sys.levels[0].bus;
    let l3 = staged.sys.levels[1].bus;
    let feed = staged.asm.port(l2, PortRole::MemSidePorts).unwrap();
    let sink = staged.asm.port(l3, PortRole::CpuSidePorts).unwrap();

    staged.asm.connect(feed, sink).unwrap();
    let err = topology(staged.asm.connect(sink, feed).unwrap_err());
    assert_eq!(
        err,
        TopologyError::PortOccupied {
            port: "system.l2bus.mem_side_ports".to_string(),
            peer: "system.l3bus.cpu_side_ports".to_string(),
        }
    );
}

#[test]
fn test_incompatible_ports_rejected() {
    let mut staged = Staged::new(&test_config());
    let icache_port = staged.asm.port(staged.sys.cpu, PortRole::IcachePort).unwrap();
    let mem_side = staged
        .asm
        .port(staged.sys.levels[0].cache, PortRole::MemSide)
        .unwrap();

    let err = topology(staged.asm.connect(icache_port, mem_side).unwrap_err());
    assert_eq!(
        err,
        TopologyError::IncompatiblePorts {
            from: "system.cpu.icache_port".to_string(),
            to: "system.l2cache.mem_side".to_string(),
            kind: "requestor".to_string(),
        }
    );
    assert!(staged.asm.graph().connections().is_empty());
}

#[test]
fn test_unknown_role_rejected() {
    let staged = Staged::new(&test_config());
    let err = topology(staged.asm.port(staged.sys.cpu, PortRole::Pio).unwrap_err());
    assert_eq!(
        err,
        TopologyError::UnknownPort {
            component: "system.cpu".to_string(),
            role: "pio".to_string(),
        }
    );
}

#[test]
fn test_island_is_disconnected() {
    let mut staged = Staged::new(&test_config());
    staged.wire_all();

    let x = staged.asm.add_crossbar("island_a", Tier::Memory).unwrap();
    let y = staged.asm.add_crossbar("island_b", Tier::Memory).unwrap();
    let x_out = staged.asm.port(x, PortRole::MemSidePorts).unwrap();
    let x_in = staged.asm.port(x, PortRole::CpuSidePorts).unwrap();
    let y_out = staged.asm.port(y, PortRole::MemSidePorts).unwrap();
    let y_in = staged.asm.port(y, PortRole::CpuSidePorts).unwrap();
    staged.asm.connect(x_out, y_in).unwrap();
    staged.asm.connect(y_out, x_in).unwrap();

    let err = topology(staged.asm.finalize().unwrap_err());
    assert_eq!(
        err,
        TopologyError::Disconnected {
            components: vec![
                "system.island_a".to_string(),
                "system.island_b".to_string(),
            ],
        }
    );
}

#[test]
fn test_cycle_detected() {
    let mut staged = Staged::new(&test_config());
    staged.wire_all();

    let back = staged.asm.port(staged.sys.membus, PortRole::MemSidePorts).unwrap();
    let l2_in = staged
        .asm
        .port(staged.sys.levels[0].bus, PortRole::CpuSidePorts)
        .unwrap();
    staged.asm.connect(back, l2_in).unwrap();

    match topology(staged.asm.finalize().unwrap_err()) {
        TopologyError::Cycle { components } => {
            for name in ["system.l2bus", "system.l2cache", "system.l3bus", "system.membus"] {
                assert!(components.iter().any(|c| c == name), "{name} missing");
            }
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn test_cpu_without_path_to_memory() {
    let config = config_with_levels(0);
    let mut asm = TopologyAssembler::new();
    let sys = asm.create_system(&config).unwrap();
    let port = |asm: &TopologyAssembler, c: ComponentId, r: PortRole| asm.port(c, r).unwrap();

    let dead_end = asm.add_crossbar("dead_end", Tier::L2).unwrap();
    for (cpu_port, cache) in [
        (PortRole::IcachePort, sys.icache),
        (PortRole::DcachePort, sys.dcache),
    ] {
        let upstream = port(&asm, sys.cpu, cpu_port);
        let cpu_side = port(&asm, cache, PortRole::CpuSide);
        let mem_side = port(&asm, cache, PortRole::MemSide);
        let bus_side = port(&asm, dead_end, PortRole::CpuSidePorts);
        asm.connect(upstream, cpu_side).unwrap();
        asm.connect(mem_side, bus_side).unwrap();
    }

    let controllers = asm.create_interrupt_controller(sys.cpu).unwrap();
    let pio = port(&asm, controllers[0], PortRole::Pio);
    let int_requestor = port(&asm, controllers[0], PortRole::IntRequestor);
    let int_responder = port(&asm, controllers[0], PortRole::IntResponder);
    let dead_out = port(&asm, dead_end, PortRole::MemSidePorts);
    let mem_in = port(&asm, sys.membus, PortRole::CpuSidePorts);
    let mem_out = port(&asm, sys.membus, PortRole::MemSidePorts);
    asm.connect(dead_out, pio).unwrap();
    asm.connect(int_requestor, mem_in).unwrap();
    asm.connect(mem_out, int_responder).unwrap();

    asm.attach_system_port(sys.membus).unwrap();
    asm.attach_memory_controller(sys.membus, sys.mem_ctrl, sys.mem_range)
        .unwrap();
    asm.attach_workload(sys.cpu, Process::from_config(&config.workload))
        .unwrap();

    assert_eq!(
        topology(asm.finalize().unwrap_err()),
        TopologyError::NoPathToMemory {
            from: "system.cpu".to_string(),
        }
    );
}

#[test]
fn test_finalized_graph_serializes() {
    let mut staged = Staged::new(&test_config());
    staged.wire_all();
    let graph = staged.finalize();

    let json = graph.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["system"]["mem_mode"], "timing");
    assert_eq!(value["system"]["clk_domain"]["period"], 1000);
    assert!(json.contains("system.l3cache"));
    assert!(json.contains("X86LocalApic"));
    assert!(json.contains("DDR3_1600_8x8"));
}
