//! # Engine Tests
//!
//! Tests for exit events, termination-cause classification, the dry-run engine and the
//! external engine.

use memhier_core::sim::{
    DryRunEngine, Engine, ExitEvent, ExternalEngine, NORMAL_EXIT_CAUSE, TerminationCause,
    parse_exit_line,
};
use memhier_core::soc::build_system;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{test_config, write_file};

#[rstest]
#[case(NORMAL_EXIT_CAUSE, TerminationCause::NormalExit)]
#[case("normal exit", TerminationCause::NormalExit)]
#[case("a thread reached the max instruction count limit", TerminationCause::TickLimit)]
#[case("simulate() limit reached", TerminationCause::TickLimit)]
#[case("hit breakpoint", TerminationCause::Breakpoint)]
#[case("fatal: page fault at 0x0", TerminationCause::Fault)]
#[case("user interrupt received", TerminationCause::Signal)]
#[case("checkpoint", TerminationCause::Other)]
fn test_classify(#[case] cause: &str, #[case] expected: TerminationCause) {
    assert_eq!(TerminationCause::classify(cause), expected);
    assert_eq!(ExitEvent::new(cause, 1).kind(), expected);
}

#[test]
fn test_exit_line_round_trip() {
    let event = ExitEvent::new("simulate() limit reached", 1_000_000);
    assert_eq!(parse_exit_line(&event.to_string()), Some(event));
}

#[test]
fn test_exit_line_ignores_noise() {
    assert_eq!(parse_exit_line(""), None);
    assert_eq!(parse_exit_line("Exiting @ tick because"), None);
    assert_eq!(
        parse_exit_line("  Exiting @ tick 7 because m5_exit instruction encountered  "),
        Some(ExitEvent::new("m5_exit instruction encountered", 7))
    );
}

#[test]
fn test_dry_run_exits_normally_at_tick_zero() {
    let graph = build_system(&test_config()).unwrap();
    let mut engine = DryRunEngine::new();
    engine.instantiate(&graph).unwrap();
    let event = engine.simulate(&graph).unwrap();
    assert_eq!(event, ExitEvent::normal(0));
    assert_eq!(event.kind(), TerminationCause::NormalExit);
}

#[test]
fn test_dry_run_requires_instantiate() {
    let graph = build_system(&test_config()).unwrap();
    let mut engine = DryRunEngine::new();
    assert!(engine.simulate(&graph).is_err());
}

#[cfg(unix)]
mod external {
    use pretty_assertions::assert_eq;

    use super::*;

    const RUN_OK: &[u8] = b"test -s \"$1\" || exit 9\n\
echo 'Beginning simulation!'\n\
echo 'Exiting @ tick 5000 because exiting with last active thread context'\n";

    const RUN_FAIL: &[u8] = b"echo 'Exiting @ tick 42 because fatal: bad address'\n\
echo 'panic' >&2\n\
exit 3\n";

    const RUN_SILENT: &[u8] = b"exit 0\n";

    #[test]
    fn test_external_engine_reports_exit() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_file(dir.path(), "engine.sh", RUN_OK);
        let dump = dir.path().join("config.json");
        let graph = build_system(&test_config()).unwrap();

        let mut engine =
            ExternalEngine::new("/bin/sh", &dump).with_args([script.display().to_string()]);
        engine.instantiate(&graph).unwrap();
        assert_eq!(engine.config_path(), dump.as_path());

        let dumped: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&dump).unwrap()).unwrap();
        assert_eq!(dumped["system"]["mem_ranges"][0]["size"], 512 * 1024 * 1024);

        let event = engine.simulate(&graph).unwrap();
        assert_eq!(event, ExitEvent::normal(5000));
    }

    #[test]
    fn test_external_engine_failure_keeps_partial_progress() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_file(dir.path(), "engine.sh", RUN_FAIL);
        let graph = build_system(&test_config()).unwrap();

        let mut engine = ExternalEngine::new("/bin/sh", dir.path().join("config.json"))
            .with_args([script.display().to_string()]);
        engine.instantiate(&graph).unwrap();

        let err = engine.simulate(&graph).unwrap_err();
        assert_eq!(err.tick, Some(42));
        assert_eq!(err.cause.as_deref(), Some("fatal: bad address"));
        assert!(err.message.contains("panic"));
    }

    #[test]
    fn test_external_engine_without_exit_line() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_file(dir.path(), "engine.sh", RUN_SILENT);
        let graph = build_system(&test_config()).unwrap();

        let mut engine = ExternalEngine::new("/bin/sh", dir.path().join("config.json"))
            .with_args([script.display().to_string()]);
        engine.instantiate(&graph).unwrap();

        let err = engine.simulate(&graph).unwrap_err();
        assert_eq!(err.tick, None);
        assert!(err.message.contains("without reporting an exit event"));
    }

    #[test]
    fn test_external_engine_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_system(&test_config()).unwrap();
        let mut engine =
            ExternalEngine::new(dir.path().join("no-such-engine"), dir.path().join("config.json"));
        engine.instantiate(&graph).unwrap();
        assert!(engine.simulate(&graph).is_err());
    }
}
