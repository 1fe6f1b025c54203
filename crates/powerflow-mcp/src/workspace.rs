//! Scratch directory holding solved networks.

use std::fs;
use std::path::{Path, PathBuf};

use powerflow_core::PowerflowResult;
use tracing::debug;

/// Directory where `run` persists networks and `analyze` reads them back.
///
/// Only catalog names are ever passed to [`Workspace::case_path`], which keeps
/// every path inside the directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create the directory (and parents) if needed.
    pub fn create(root: impl Into<PathBuf>) -> PowerflowResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(dir = %root.display(), "scratch directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn case_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_makes_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let workspace = Workspace::create(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(workspace.root(), nested.as_path());
        assert_eq!(workspace.case_path("case9"), nested.join("case9.json"));
    }

    #[test]
    fn create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        Workspace::create(dir.path()).unwrap();
        Workspace::create(dir.path()).unwrap();
    }
}
