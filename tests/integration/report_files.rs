use loadprobe_cli::config::LoadConfig;
use loadprobe_cli::core::LoadError;
use loadprobe_cli::runner::LoadRunner;
use loadprobe_cli::sink::{JsonFileSink, MemorySink, ReportSink, SinkSet};
use loadprobe_cli::targets::SimulatedTarget;
use loadprobe_cli::workload::KindMix;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn config() -> LoadConfig {
    LoadConfig {
        name: "files".to_string(),
        requests: 6,
        workers: 3,
        seed: Some(3),
        monitor_resources: false,
        workload: vec![KindMix::new("calculation", 1.0).with_params(json!({"income": 52_000}))],
        ..LoadConfig::default()
    }
}

/// The JSON report carries the summary and, when asked, every result
#[tokio::test]
async fn test_json_report_with_raw_results() {
    let temp = TempDir::new().unwrap();
    let sink = JsonFileSink::new(temp.path().join("out")).with_raw_results(true);

    let report = LoadRunner::new(config())
        .unwrap()
        .run(Arc::new(SimulatedTarget::new()), &sink, &CancellationToken::new())
        .await
        .unwrap();

    let written = sink.written();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0], sink.path_for(&report));

    let value: Value = serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(value["report"]["name"], "files");
    assert_eq!(value["report"]["summary"]["total"], 6);
    assert_eq!(value["report"]["sla"]["meets_sla"], true);
    assert_eq!(value["raw_results"].as_array().unwrap().len(), 6);
}

/// Every sink in a set receives the report
#[tokio::test]
async fn test_sink_set_fans_out() {
    let temp = TempDir::new().unwrap();
    let memory = Arc::new(MemorySink::new());

    struct Shared(Arc<MemorySink>);
    impl ReportSink for Shared {
        fn name(&self) -> &str {
            "shared-memory"
        }
        fn record(&self, report: &loadprobe_cli::runner::RunReport) -> anyhow::Result<()> {
            self.0.record(report)
        }
    }

    let sinks = SinkSet::new()
        .with(Box::new(Shared(Arc::clone(&memory))))
        .with(Box::new(JsonFileSink::new(temp.path())));

    LoadRunner::new(config())
        .unwrap()
        .run(Arc::new(SimulatedTarget::new()), &sinks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(memory.reports().len(), 1);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
}

/// An unwritable output location surfaces as a sink error
#[tokio::test]
async fn test_unwritable_output_is_sink_error() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();
    let sink = JsonFileSink::new(blocker.join("reports"));

    let err = LoadRunner::new(config())
        .unwrap()
        .run(Arc::new(SimulatedTarget::new()), &sink, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<LoadError>(), Some(LoadError::SinkError { .. })));
}
