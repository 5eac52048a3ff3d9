//! Pipelines and configuration loaded from files.

use alg_core::{Framework, FrameworkConfig, Pipeline, PipelineError, VersionPolicy};
use alg_test_utils::{assert_close, setup_framework, y_values};
use alg_workspace::Workspace;
use pretty_assertions::assert_eq;
use std::io::Write;

const REDUCTION: &str = r#"
[[step]]
algorithm = "CreateWorkspace"

[step.properties]
DataX = [0, 1, 2]
DataY = [1.0, 3.0, 2.0, 2.0]
NSpec = 2
WorkspaceTitle = "run 1234"
OutputWorkspace = "raw"

[[step]]
algorithm = "AddSampleLog"
properties = { Workspace = "raw", LogName = "temperature", LogText = "4.2", LogType = "Number" }

[[step]]
algorithm = "NormaliseToTotal"
properties = { InputWorkspace = "raw", OutputWorkspace = "normalised" }
"#;

fn write_temp(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn reduction_pipeline_from_file() {
    let file = write_temp(REDUCTION);
    let framework = setup_framework();

    let reports = Pipeline::from_file(file.path())
        .unwrap()
        .run(&framework)
        .unwrap();
    let algorithms: Vec<&str> = reports.iter().map(|r| r.algorithm.as_str()).collect();
    assert_eq!(algorithms, vec!["CreateWorkspace", "AddSampleLog", "NormaliseToTotal"]);

    let normalised = framework.data_service().retrieve("normalised").unwrap();
    assert_close(y_values(&normalised, 0)[1], 0.375);
    let guard = normalised.read();
    assert_eq!(guard.metadata().title, "run 1234");
    assert!(guard.metadata().run.has_log("temperature"));
}

#[test]
fn later_steps_do_not_run_after_a_failure() {
    let framework = setup_framework();
    let pipeline = Pipeline::from_toml_str(
        r#"
        [[step]]
        algorithm = "FailAfterOutput"
        properties = { OutputWorkspace = "first" }

        [[step]]
        algorithm = "CreateSingleValuedWorkspace"
        properties = { DataValue = 1.0, OutputWorkspace = "second" }
        "#,
    )
    .unwrap();

    let err = pipeline.run(&framework).unwrap_err();
    assert!(matches!(err, PipelineError::Step { index: 1, .. }));
    assert!(framework.data_service().is_empty());
}

#[test]
fn unreadable_pipeline_names_the_path() {
    let err = Pipeline::from_file("/nonexistent/steps.toml").unwrap_err();
    assert!(matches!(err, PipelineError::Io { ref path, .. } if path == "/nonexistent/steps.toml"));
}

#[test]
fn empty_pipeline_does_nothing() {
    let framework = setup_framework();
    let reports = Pipeline::from_toml_str("").unwrap().run(&framework).unwrap();
    assert!(reports.is_empty());
}

#[test]
fn config_file_drives_the_framework() {
    let file = write_temp(
        r#"
        [parallel]
        enabled = false

        [algorithms]
        default_version_policy = "oldest"

        [data_service]
        replace_existing = false
        "#,
    );
    let config = FrameworkConfig::from_file(file.path()).unwrap();
    assert_eq!(config.algorithms.default_version_policy, VersionPolicy::Oldest);

    let framework = Framework::builder().config(config).build().unwrap();
    assert!(!framework.parallel().is_parallel());
    assert_eq!(
        framework.create_algorithm("Integration", None).unwrap().version(),
        1
    );
    assert!(!framework.config().data_service.replace_existing);
}
