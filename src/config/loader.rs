// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PilotError, Result};
use crate::fs::FileSystem;
use crate::types::Answer;

pub const ENV_EXECUTABLE: &str = "TFPILOT_EXECUTABLE";
pub const ENV_PARALLELISM: &str = "TFPILOT_PARALLELISM";
pub const ENV_DEFAULT_ANSWER: &str = "TFPILOT_DEFAULT_ANSWER";

/// Values given on the command line; applied after the file and the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub executable: Option<String>,
    pub parallelism: Option<usize>,
    pub default_answer: Option<Answer>,
}

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`. No overrides, no validation.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Resolve the full configuration.
///
/// - `explicit`: a path given with `--config`; it must exist.
/// - otherwise [`default_config_path`] is read if present, and built-in
///   defaults are used if not.
///
/// Environment overrides come next, then `overrides`, then validation.
pub fn load_config(
    fs: &dyn FileSystem,
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ConfigFile> {
    let mut raw = match explicit {
        Some(path) if !fs.is_file(path) => {
            return Err(PilotError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Some(path) => load_from_path(fs, path)?,
        None => {
            let path = default_config_path();
            if fs.exists(&path) {
                debug!(path = %path.display(), "loading config file");
                load_from_path(fs, &path)?
            } else {
                debug!(path = %path.display(), "no config file; using defaults");
                RawConfigFile::default()
            }
        }
    };

    apply_env_overrides(&mut raw, |key| std::env::var(key).ok())?;
    apply_overrides(&mut raw, overrides);

    ConfigFile::try_from(raw)
}

/// Apply `TFPILOT_*` variables looked up through `lookup`.
pub fn apply_env_overrides<F>(raw: &mut RawConfigFile, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(exe) = lookup(ENV_EXECUTABLE) {
        raw.config.executable = exe;
    }

    if let Some(value) = lookup(ENV_PARALLELISM) {
        raw.config.parallelism = value.trim().parse().map_err(|e| {
            PilotError::Config(format!("{ENV_PARALLELISM}={value:?} is not a number: {e}"))
        })?;
    }

    if let Some(value) = lookup(ENV_DEFAULT_ANSWER) {
        raw.config.default_answer = value
            .parse()
            .map_err(|e| PilotError::Config(format!("{ENV_DEFAULT_ANSWER}: {e}")))?;
    }

    Ok(())
}

pub fn apply_overrides(raw: &mut RawConfigFile, overrides: &ConfigOverrides) {
    if let Some(exe) = &overrides.executable {
        raw.config.executable = exe.clone();
    }
    if let Some(n) = overrides.parallelism {
        raw.config.parallelism = n;
    }
    if let Some(answer) = overrides.default_answer {
        raw.config.default_answer = answer;
    }
}

/// `tfpilot.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("tfpilot.toml")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_file_values() {
        let mut raw: RawConfigFile =
            toml::from_str("[config]\nexecutable = \"terraform\"\nparallelism = 2\n").unwrap();

        apply_env_overrides(
            &mut raw,
            env(&[
                (ENV_EXECUTABLE, "tofu"),
                (ENV_PARALLELISM, " 8 "),
                (ENV_DEFAULT_ANSWER, "yes"),
            ]),
        )
        .unwrap();

        assert_eq!(raw.config.executable, "tofu");
        assert_eq!(raw.config.parallelism, 8);
        assert_eq!(raw.config.default_answer, Answer::Yes);
    }

    #[test]
    fn bad_env_parallelism_is_config_error() {
        let mut raw = RawConfigFile::default();
        let err = apply_env_overrides(&mut raw, env(&[(ENV_PARALLELISM, "many")])).unwrap_err();
        assert!(matches!(err, PilotError::Config(_)));
        assert!(err.to_string().contains(ENV_PARALLELISM));
    }

    #[test]
    fn bad_env_answer_is_config_error() {
        let mut raw = RawConfigFile::default();
        let err = apply_env_overrides(&mut raw, env(&[(ENV_DEFAULT_ANSWER, "maybe")])).unwrap_err();
        assert!(matches!(err, PilotError::Config(_)));
    }

    #[test]
    fn cli_overrides_win_over_env() {
        let mut raw = RawConfigFile::default();
        apply_env_overrides(&mut raw, env(&[(ENV_PARALLELISM, "8")])).unwrap();
        apply_overrides(
            &mut raw,
            &ConfigOverrides {
                parallelism: Some(3),
                ..Default::default()
            },
        );
        assert_eq!(raw.config.parallelism, 3);
        assert_eq!(raw.config.executable, "terragrunt");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let fs = MockFileSystem::new();
        let err = load_config(&fs, Some(Path::new("nope.toml")), &ConfigOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("nope.toml"), "{err}");
    }

    #[test]
    fn missing_default_file_means_defaults() {
        let fs = MockFileSystem::new();
        let cfg = load_config(&fs, None, &ConfigOverrides::default()).unwrap();
        assert_eq!(cfg.config.all_marker, "--all");
    }

    #[test]
    fn explicit_file_is_read_and_validated() {
        let fs = MockFileSystem::new();
        fs.add_file("conf/tfpilot.toml", "[config]\nparallelism = 0\n");
        let path = Path::new("conf/tfpilot.toml");

        let err = load_config(&fs, Some(path), &ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("parallelism"));

        let ok = load_config(
            &fs,
            Some(path),
            &ConfigOverrides {
                parallelism: Some(4),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(ok.config.parallelism, 4);
    }

    #[test]
    fn malformed_toml_is_a_toml_error() {
        let fs = MockFileSystem::new();
        fs.add_file("tfpilot.toml", "[config\n");
        let err = load_config(&fs, None, &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, PilotError::Toml(_)), "{err:?}");
    }
}
