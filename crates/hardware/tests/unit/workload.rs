//! # Workload Tests
//!
//! Tests for the workload record attached to the CPU and for binary probing.

use memhier_core::ConfigError;
use memhier_core::config::Isa;
use memhier_core::sim::{Process, SeWorkload, WorkloadArg};
use memhier_core::soc::build_system;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{
    EM_AARCH64, EM_X86_64, benchmark_args, elf_header, test_config, write_file,
};

#[test]
fn test_argument_vector_preserved_exactly() {
    let mut config = test_config();
    config.workload.binary = "swaptions".into();
    config.workload.args = benchmark_args();

    let graph = build_system(&config).unwrap();
    let cpu = graph.graph().component(graph.cpus()[0]).unwrap();
    let process = cpu.workload().unwrap();

    assert_eq!(process.executable().to_str(), Some("swaptions"));
    assert_eq!(process.args(), benchmark_args().as_slice());
    assert_eq!(
        process.argv(),
        vec!["swaptions", "-ns", "16", "-sm", "5000", "-nt", "8"]
    );
    assert_eq!(cpu.thread_contexts(), 1);
}

#[test]
fn test_argument_types_survive_json() {
    let config = memhier_core::Config::from_json_str(
        r#"{ "workload": { "binary": "swaptions", "args": ["-ns", 16, "-sm", 5000, "-nt", 8] } }"#,
    )
    .unwrap();
    let process = Process::from_config(&config.workload);
    assert_eq!(process.args(), benchmark_args().as_slice());
    assert!(matches!(process.args()[1], WorkloadArg::Int(16)));
}

#[test]
fn test_command_starts_with_executable() {
    let process = Process::new("/bin/hello", [WorkloadArg::from("world")]);
    assert_eq!(
        process.cmd(),
        &[WorkloadArg::from("/bin/hello"), WorkloadArg::from("world")]
    );
}

#[test]
fn test_probe_accepts_matching_binary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "hello", &elf_header(EM_X86_64, 0x40_1000));

    let workload = SeWorkload::init_compatible(&path, Isa::X86).unwrap();
    assert_eq!(workload.binary(), path.as_path());
    assert_eq!(workload.isa(), Isa::X86);
    assert_eq!(workload.entry(), 0x40_1000);
}

#[rstest]
#[case(EM_AARCH64, Isa::X86)]
#[case(EM_X86_64, Isa::Arm)]
#[case(EM_X86_64, Isa::Riscv)]
fn test_probe_rejects_other_architecture(#[case] machine: u16, #[case] isa: Isa) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "foreign", &elf_header(machine, 0));
    assert!(matches!(
        SeWorkload::init_compatible(&path, isa),
        Err(ConfigError::IncompatibleBinary { .. })
    ));
}

#[test]
fn test_probe_rejects_non_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "script.sh", b"#!/bin/sh\necho hi\n");
    assert!(matches!(
        SeWorkload::init_compatible(&path, Isa::X86),
        Err(ConfigError::Binary { .. })
    ));
}

#[test]
fn test_probe_missing_binary() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SeWorkload::init_compatible(&dir.path().join("absent"), Isa::X86),
        Err(ConfigError::Io { .. })
    ));
}
