use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::tempdir;

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(file)
}

#[test]
fn generate_cli_prints_skin_json_to_stdout() {
    let mut cmd = Command::cargo_bin("ado-skin").expect("Binary exists");

    cmd.arg("generate")
        .arg("--config")
        .arg(demo("plan.yaml"))
        .arg("--snapshot")
        .arg(demo("snapshot.json"))
        .env_remove("ADO_SKIN_PROJECT");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"projectName\": \"Contoso Portal\""))
        .stdout(predicate::str::contains("No data available"));
}

#[test]
fn generate_cli_writes_output_file() {
    let out_dir = tempdir().unwrap();
    let output = out_dir.path().join("skin.json");
    let mut cmd = Command::cargo_bin("ado-skin").expect("Binary exists");

    cmd.arg("generate")
        .arg("--config")
        .arg(demo("plan.yaml"))
        .arg("--snapshot")
        .arg(demo("snapshot.json"))
        .arg("--output")
        .arg(&output)
        .env("ADO_SKIN_PROJECT", "Overridden");

    cmd.assert().success();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["projectName"], "Overridden");
    assert_eq!(written["suites"].as_array().unwrap().len(), 3);
}

#[test]
fn generate_cli_fails_on_missing_snapshot() {
    let mut cmd = Command::cargo_bin("ado-skin").expect("Binary exists");

    cmd.arg("generate")
        .arg("--config")
        .arg(demo("plan.yaml"))
        .arg("--snapshot")
        .arg("/definitely/not/here.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read snapshot file"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use ado_skin::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Generate {
            config: PathBuf::from("dummy.yaml"),
            snapshot: PathBuf::from("dummy.json"),
            output: None,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
