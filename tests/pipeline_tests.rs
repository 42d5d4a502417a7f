#![cfg(unix)]

mod common;

use common::{fast_policy, grid, FakeStore};
use pretty_assertions::assert_eq;
use std::path::Path;
use ttpasm_trace::converter::{FormatConverter, SimulatorCommand};
use ttpasm_trace::pipeline::{
    render_summary, Pipeline, PipelineConfig, PipelineStage, PipelineState,
};
use ttpasm_trace::store::{MajorDimension, RemoteStore};
use ttpasm_trace::utils::{ConverterError, StageError, StoreError};

fn write_source(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("prog.ttpasm");
    std::fs::write(&path, "LOAD R0\nADD R1\n").unwrap();
    path
}

fn echo_converter() -> FormatConverter {
    FormatConverter::new(SimulatorCommand::new("sh", ["-c", "cat \"$2\"", "sh"]))
}

fn build(
    dir: &Path,
    backend: FakeStore,
    max_retries: u32,
    converter: FormatConverter,
) -> Pipeline<FakeStore> {
    let config = PipelineConfig::new(write_source(dir), dir.join("out"), "asm", "trace");
    Pipeline::new(
        RemoteStore::new(backend, fast_policy(max_retries)),
        converter,
        config,
    )
}

fn config_for(dir: &Path) -> PipelineConfig {
    PipelineConfig::new(dir.join("prog.ttpasm"), dir.join("out"), "asm", "trace")
}

#[test]
fn test_end_to_end_success() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["00"], &["01"]]));

    let mut pipeline = build(dir.path(), backend, 3, echo_converter());
    let run = pipeline.run();

    assert!(matches!(run.state, PipelineState::Done));
    assert!(run.is_success());
    assert_eq!(run.trace, grid(&[&["00"], &["01"]]));

    let store = pipeline.store().backend();
    assert_eq!(store.cells(&config.trace_range), grid(&[&["00"], &["01"]]));
    assert_eq!(store.gets(&config.result_range), 1);

    assert_eq!(run.timings.len(), 5);
    let stages: Vec<PipelineStage> = run.timings.iter().map(|(stage, _)| *stage).collect();
    assert_eq!(stages, PipelineStage::ALL.to_vec());
    assert!(run.timings.iter().all(|(_, t)| t.seconds() >= 0.0));
}

#[test]
fn test_source_is_cleared_then_written_as_one_column() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new()
        .with_cells(&config.source_range, grid(&[&["OLD 1"], &["OLD 2"], &["OLD 3"]]))
        .with_cells(&config.result_range, grid(&[&["00"]]));

    let mut pipeline = build(dir.path(), backend, 3, echo_converter());
    let run = pipeline.run();
    assert!(run.is_success());

    let store = pipeline.store().backend();
    let (address, body) = &store.updates[0];
    assert_eq!(address, &config.source_range);
    assert_eq!(body.major_dimension, MajorDimension::Columns);
    assert_eq!(body.values, grid(&[&["LOAD R0", "ADD R1"]]));

    // No stale third line survives
    assert_eq!(
        store.cells(&config.source_range),
        grid(&[&["LOAD R0"], &["ADD R1"]])
    );
    assert_eq!(store.clears, vec![config.source_range.clone(), config.trace_range.clone()]);
}

#[test]
fn test_trace_is_published_row_major() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["00"]]));
    let converter = FormatConverter::new(SimulatorCommand::new(
        "sh",
        ["-c", "printf 'pc\\tir\\n00\\t00\\n'", "sh"],
    ));

    let mut pipeline = build(dir.path(), backend, 3, converter);
    let run = pipeline.run();
    assert!(run.is_success());

    let store = pipeline.store().backend();
    let (address, body) = store.updates.last().unwrap();
    assert_eq!(address, &config.trace_range);
    assert_eq!(body.major_dimension, MajorDimension::Rows);
    assert_eq!(body.values, grid(&[&["pc", "ir"], &["00", "00"]]));
}

#[test]
fn test_pending_result_fails_at_harvest() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["Loading..."]]));

    let mut pipeline = build(dir.path(), backend, 3, echo_converter());
    let run = pipeline.run();

    assert!(matches!(
        run.state,
        PipelineState::Failed {
            stage: PipelineStage::ResultHarvested,
            cause: StageError::Store(StoreError::ComputationTimeout { attempts: 3, .. }),
        }
    ));

    let store = pipeline.store().backend();
    assert_eq!(store.gets(&config.result_range), 3);
    assert!(!store.was_updated(&config.trace_range));
    assert!(!store.clears.contains(&config.trace_range));

    // Converter never ran
    assert!(!dir.path().join("out.csv").exists());
    assert!(!dir.path().join("out.tsv").exists());
    assert_eq!(run.timings.len(), 3);
}

#[test]
fn test_error_marker_fails_with_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["#ERROR!"]]));

    let mut pipeline = build(dir.path(), backend, 2, echo_converter());
    let run = pipeline.run();

    let (stage, cause) = run.failure().unwrap();
    assert_eq!(stage, PipelineStage::ResultHarvested);
    assert!(matches!(
        cause,
        StageError::Store(StoreError::DataUnavailable { .. })
    ));
}

#[test]
fn test_simulator_failure_stops_before_publish() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["00"]]));
    let converter = FormatConverter::new(SimulatorCommand::new("sh", ["-c", "exit 4", "sh"]));

    let mut pipeline = build(dir.path(), backend, 3, converter);
    let run = pipeline.run();

    assert!(matches!(
        run.state,
        PipelineState::Failed {
            stage: PipelineStage::Converted,
            cause: StageError::Converter(ConverterError::ToolExit { .. }),
        }
    ));
    assert!(!pipeline.store().backend().was_updated(&config.trace_range));
    // Partial local artifacts are kept
    assert!(dir.path().join("out.csv").exists());
}

#[test]
fn test_missing_source_fails_at_setup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let mut pipeline = Pipeline::new(
        RemoteStore::new(FakeStore::new(), fast_policy(3)),
        echo_converter(),
        config,
    );

    let run = pipeline.run();

    assert!(matches!(
        run.state,
        PipelineState::Failed {
            stage: PipelineStage::Setup,
            cause: StageError::Source { .. },
        }
    ));
    assert_eq!(run.timings.len(), 1);
    assert_eq!(pipeline.store().backend().auth_calls, 0);
}

#[test]
fn test_success_summary_lists_files_timings_and_url() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["00"]]));

    let mut pipeline = build(dir.path(), backend, 3, echo_converter());
    let run = pipeline.run();
    let summary = render_summary(
        &run,
        Some("https://docs.google.com/spreadsheets/d/trace/edit"),
    );

    assert!(summary.starts_with("Successfully wrote output to"));
    assert!(summary.contains("out.csv"));
    assert!(summary.contains("out.tsv"));
    assert_eq!(summary.matches(" took ").count(), 5);
    assert!(summary.contains("Downloading RAM file took"));
    assert!(summary.ends_with("https://docs.google.com/spreadsheets/d/trace/edit"));
}

#[test]
fn test_failure_summary_is_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["Loading..."]]));

    let mut pipeline = build(dir.path(), backend, 1, echo_converter());
    let run = pipeline.run();
    let summary = render_summary(&run, None);

    assert_eq!(summary.lines().count(), 1);
    assert!(summary.starts_with("Pipeline failed at stage ResultHarvested"));
    assert!(summary.contains("timed out"));
}

#[test]
fn test_simulator_stack_trace_keeps_failure_summary_on_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new().with_cells(&config.result_range, grid(&[&["00"]]));
    let converter = FormatConverter::new(SimulatorCommand::new(
        "sh",
        [
            "-c",
            "printf 'Exception in thread main\\n\\tat Main.main(Main.java:1)\\n' >&2; exit 1",
            "sh",
        ],
    ));

    let mut pipeline = build(dir.path(), backend, 3, converter);
    let run = pipeline.run();
    let summary = render_summary(&run, None);

    assert_eq!(summary.lines().count(), 1);
    assert!(summary.starts_with("Pipeline failed at stage Converted"));
    assert!(summary.contains("Exception in thread main at Main.main(Main.java:1)"));
}

#[test]
fn test_refused_login_is_retried_during_setup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let backend = FakeStore::new()
        .with_cells(&config.result_range, grid(&[&["00"]]))
        .with_auth_resets(1);

    let mut pipeline = build(dir.path(), backend, 3, echo_converter());
    let run = pipeline.run();

    assert!(run.is_success());
    assert_eq!(pipeline.store().backend().auth_calls, 2);
}
