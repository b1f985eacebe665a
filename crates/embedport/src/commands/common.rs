//! Common utilities for CLI commands

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Resolves a path to an absolute artifact directory.
/// If the path is relative, it's joined with the current directory.
pub fn resolve_artifact_dir(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
