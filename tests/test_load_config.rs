use ado_skin::config::RequirementsConfig;
use ado_skin::load_config::{load_config, PROJECT_ENV};
use ado_skin::trace::TraceAdapter;
use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

/// A full config file parses into typed sections, with defaults for omitted flags.
#[test]
#[serial]
fn test_load_config_parses_all_sections() {
    env::remove_var(PROJECT_ENV);
    let file = config_file(
        r#"
project_name: Contoso
plan_id: 42
suite_ids: [7, 8]
include_history: true
history_utc_offset_minutes: -300
requirements:
  source: by_query
  query_id: q-requirements
traces:
  - title: Change requests
    mode: pcr-test
    query_id: q-pcr
    adapter: pcr_relations
"#,
    );

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.project_name, "Contoso");
    assert_eq!(config.plan_id, Some(42));
    assert_eq!(config.suite_ids, vec![7, 8]);
    assert!(config.flatten_single_suite);
    assert!(config.include_history);
    assert!(!config.include_attachments);
    assert_eq!(config.history_offset().local_minus_utc(), -300 * 60);
    assert_eq!(
        config.requirements,
        Some(RequirementsConfig::ByQuery {
            query_id: "q-requirements".into()
        })
    );
    assert_eq!(config.traces.len(), 1);
    assert_eq!(config.traces[0].adapter, TraceAdapter::PcrRelations);
    assert!(!config.traces[0].exclude_common_columns);
}

/// The project name can be supplied from the environment instead of the file.
#[test]
#[serial]
fn test_load_config_project_from_env() {
    let file = config_file("project_name: FromFile\nplan_id: 1\nsuite_ids: [2]\n");

    env::set_var(PROJECT_ENV, "FromEnv");
    let config = load_config(file.path()).expect("Config should load");
    env::remove_var(PROJECT_ENV);

    assert_eq!(config.project_name, "FromEnv");
    assert_eq!(config.validate().unwrap(), 1);
}

#[test]
#[serial]
fn test_load_config_errors_on_bad_yaml_or_missing_file() {
    env::remove_var(PROJECT_ENV);
    let file = config_file("traces:\n  - title: Broken\n    adapter: not_an_adapter\n");
    let err = load_config(file.path()).expect_err("unknown adapter should fail");
    assert!(err.to_string().contains("Failed to parse config YAML"));

    let err = load_config("/definitely/not/here.yaml").expect_err("missing file should fail");
    assert!(err.to_string().contains("Failed to read config file"));
}

/// Loading succeeds without plan or suites; validation is what rejects them.
#[test]
#[serial]
fn test_load_config_defers_validation() {
    env::remove_var(PROJECT_ENV);
    let file = config_file("project_name: Contoso\n");
    let config = load_config(file.path()).expect("Config should load");
    assert!(config.validate().is_err());
}
