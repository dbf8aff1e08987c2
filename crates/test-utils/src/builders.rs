#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tfpilot::fs::mock::MockFileSystem;
use tfpilot::types::ExecutionRequest;

/// Describes a directory tree of modules for discovery tests; can be
/// turned into a [`MockFileSystem`] or written to a real directory.
#[derive(Debug, Clone)]
pub struct ModuleTreeBuilder {
    root: PathBuf,
    files: Vec<(PathBuf, String)>,
    dirs: Vec<PathBuf>,
}

impl ModuleTreeBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A module directory holding a `main.tf`.
    pub fn module(self, rel: &str) -> Self {
        self.file(&format!("{rel}/main.tf"), "")
    }

    /// A terragrunt unit directory holding a `terragrunt.hcl`.
    pub fn unit(self, rel: &str) -> Self {
        self.file(&format!("{rel}/terragrunt.hcl"), "")
    }

    pub fn file(mut self, rel: &str, content: &str) -> Self {
        self.files.push((self.root.join(rel), content.to_string()));
        self
    }

    /// A directory with no marker files.
    pub fn dir(mut self, rel: &str) -> Self {
        self.dirs.push(self.root.join(rel));
        self
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn build_mock(&self) -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir(&self.root);
        for dir in &self.dirs {
            fs.add_dir(dir);
        }
        for (path, content) in &self.files {
            fs.add_file(path, content.as_bytes().to_vec());
        }
        fs
    }

    /// Create the tree on disk under [`root`](Self::root).
    pub fn write(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        for dir in &self.dirs {
            fs::create_dir_all(dir)?;
        }
        for (path, content) in &self.files {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        Ok(())
    }
}

pub fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn request(executable: &str, items: &[&str], dir: impl Into<PathBuf>) -> ExecutionRequest {
    ExecutionRequest::new(executable, items.iter().copied(), dir)
}
