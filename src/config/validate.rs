// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PilotError, Result};
use crate::parallel::ModuleMatcher;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PilotError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.modules))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_modules(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.executable.trim().is_empty() {
        return Err(PilotError::Config(
            "[config].executable must not be empty".to_string(),
        ));
    }

    if cfg.config.parallelism == 0 {
        return Err(PilotError::Config(
            "[config].parallelism must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.all_marker.trim().is_empty() {
        return Err(PilotError::Config(
            "[config].all_marker must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_modules(cfg: &RawConfigFile) -> Result<()> {
    if cfg.modules.markers.is_empty() {
        return Err(PilotError::Config(
            "[modules].markers must contain at least one pattern".to_string(),
        ));
    }
    // Surfaces bad globs here rather than on the first fleet run.
    ModuleMatcher::new(&cfg.modules.markers)?;
    Ok(())
}
