// tests/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;
use tfpilot::config::{load_config, ConfigOverrides};
use tfpilot::errors::PilotError;
use tfpilot::fs::RealFileSystem;
use tfpilot::types::Answer;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_file_is_loaded() {
    let file = config_file(
        r#"
[config]
executable = "tofu"
parallelism = 3
default_answer = "y"
all_marker = "--run-all"

[modules]
markers = ["*.tofu", "main.tf"]
"#,
    );

    let cfg = load_config(&RealFileSystem, Some(file.path()), &ConfigOverrides::default()).unwrap();

    assert_eq!(cfg.config.executable, "tofu");
    assert_eq!(cfg.config.parallelism, 3);
    assert_eq!(cfg.config.default_answer, Answer::Yes);
    assert_eq!(cfg.config.all_marker, "--run-all");
    assert_eq!(cfg.modules.markers, vec!["*.tofu", "main.tf"]);
}

#[test]
fn invalid_answer_is_a_toml_error() {
    let file = config_file("[config]\ndefault_answer = \"maybe\"\n");

    match load_config(&RealFileSystem, Some(file.path()), &ConfigOverrides::default()) {
        Err(PilotError::Toml(e)) => assert!(e.to_string().contains("maybe")),
        other => panic!("expected Toml error, got {other:?}"),
    }
}

#[test]
fn zero_parallelism_is_a_config_error() {
    let file = config_file("[config]\nparallelism = 0\n");

    match load_config(&RealFileSystem, Some(file.path()), &ConfigOverrides::default()) {
        Err(PilotError::Config(msg)) => assert!(msg.contains("parallelism")),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn cli_overrides_are_validated_too() {
    let file = config_file("");
    let overrides = ConfigOverrides {
        executable: Some(String::new()),
        ..Default::default()
    };

    let err = load_config(&RealFileSystem, Some(file.path()), &overrides).unwrap_err();
    assert!(err.to_string().contains("executable"), "{err}");
}
