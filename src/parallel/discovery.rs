// src/parallel/discovery.rs

//! Module discovery: which directories under a root are work units.
//!
//! A directory is a module if it directly contains a file whose name
//! matches one of the configured marker globs (`terragrunt.hcl`, `*.tf`,
//! ...). Hidden directories and symlinked directories are never entered,
//! the root itself is never a unit, and a module's subtree is not searched
//! for nested modules.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::errors::{PilotError, Result};
use crate::fs::FileSystem;
use crate::types::WorkUnit;

/// Default marker globs for provisioning files.
pub const DEFAULT_MODULE_MARKERS: &[&str] = &["terragrunt.hcl", "*.tf", "*.tf.json"];

/// Compiled marker globs, matched against bare file names.
#[derive(Debug, Clone)]
pub struct ModuleMatcher {
    set: GlobSet,
}

impl ModuleMatcher {
    pub fn new<S: AsRef<str>>(markers: &[S]) -> Result<Self> {
        if markers.is_empty() {
            return Err(PilotError::Config(
                "at least one module marker pattern is required".to_string(),
            ));
        }

        let mut builder = GlobSetBuilder::new();
        for pat in markers {
            let pat = pat.as_ref();
            let glob = Glob::new(pat).map_err(|e| {
                PilotError::Config(format!("invalid module marker pattern '{pat}': {e}"))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| PilotError::Config(format!("building module marker set: {e}")))?;

        Ok(Self { set })
    }

    pub fn is_marker(&self, file_name: &str) -> bool {
        self.set.is_match(file_name)
    }
}

impl Default for ModuleMatcher {
    fn default() -> Self {
        let mut builder = GlobSetBuilder::new();
        for pat in DEFAULT_MODULE_MARKERS {
            if let Ok(glob) = Glob::new(pat) {
                builder.add(glob);
            }
        }
        Self {
            set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn is_hidden(path: &Path) -> bool {
    file_name(path).is_some_and(|n| n.starts_with('.'))
}

fn is_module_dir(fs: &dyn FileSystem, dir: &Path, matcher: &ModuleMatcher) -> Result<bool> {
    let entries = fs.read_dir(dir)?;
    Ok(entries.iter().any(|entry| {
        fs.is_file(entry) && file_name(entry).is_some_and(|n| matcher.is_marker(n))
    }))
}

/// Find all work units below `root`, sorted by path.
///
/// Failing to list `root` is an error; unreadable subdirectories are logged
/// and skipped.
pub fn discover_work_units(
    fs: &dyn FileSystem,
    root: &Path,
    matcher: &ModuleMatcher,
) -> Result<Vec<WorkUnit>> {
    let mut units = Vec::new();
    let mut pending = fs.read_dir(root)?;

    while let Some(path) = pending.pop() {
        if !fs.is_dir(&path) || is_hidden(&path) {
            continue;
        }
        if fs.is_symlink(&path) {
            debug!(dir = %path.display(), "not following symlinked directory");
            continue;
        }

        let is_module = match is_module_dir(fs, &path, matcher) {
            Ok(m) => m,
            Err(e) => {
                warn!(dir = %path.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };

        if is_module {
            debug!(dir = %path.display(), "found module");
            units.push(WorkUnit::new(path));
            continue;
        }

        match fs.read_dir(&path) {
            Ok(children) => pending.extend(children),
            Err(e) => warn!(dir = %path.display(), error = %e, "skipping unreadable directory"),
        }
    }

    units.sort();
    Ok(units)
}
