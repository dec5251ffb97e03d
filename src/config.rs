//! Run configuration.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Executables that receive the final rpaths when none are given.
pub const DEFAULT_ENTRY_POINTS: &[&str] =
    &["octave-gui", "octave-cli", "mkoctfile", "octave-config", "gs"];

/// Roots and entry points of one relocation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocateConfig {
    /// Vendored dependency tree (package manager prefix).
    pub lib_sysroot: PathBuf,
    /// Application install tree being made relocatable.
    pub app_root: PathBuf,
    /// Flat directory receiving copies of vendored libraries.
    pub deps_dir: PathBuf,
    /// File names of the executables that carry the rpaths.
    pub entry_points: Vec<String>,
}

impl RelocateConfig {
    /// Build a configuration with absolute roots.
    ///
    /// An empty `entry_points` selects [`DEFAULT_ENTRY_POINTS`].
    pub fn new(
        lib_sysroot: &Path,
        app_root: &Path,
        deps_dir: &Path,
        entry_points: Vec<String>,
    ) -> Result<Self> {
        let entry_points = if entry_points.is_empty() {
            DEFAULT_ENTRY_POINTS.iter().map(|s| s.to_string()).collect()
        } else {
            entry_points
        };

        Ok(Self {
            lib_sysroot: absolute(lib_sysroot)?,
            app_root: absolute(app_root)?,
            deps_dir: absolute(deps_dir)?,
            entry_points,
        })
    }
}

/// Absolute and lexically normalized: `.` dropped, `..` folded into its parent.
///
/// Symlinks are not resolved, so the result still matches the paths otool
/// reports for binaries linked against the unresolved tree.
fn absolute(path: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(path)
        .with_context(|| format!("Failed to make {} absolute", path.display()))?;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
