//! Library reference resolution and origin classification.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::RelocateError;

/// Load-time placeholder meaning "search each configured rpath".
pub const RPATH_TOKEN: &str = "@rpath";

/// Prefixes of libraries shipped with the operating system.
pub const SYSTEM_PREFIXES: &[&str] = &["/System/", "/usr/"];

/// Where a library lives, which decides how it is relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Under the vendored dependency tree: copied into the deps directory.
    Vendored,
    /// Under the application tree: rewritten in place.
    Application,
    /// Provided by the OS: left untouched.
    System,
}

/// A library reference resolved to a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    pub origin: Origin,
}

/// Resolves raw load-command references against the two build trees.
#[derive(Debug, Clone)]
pub struct Classifier {
    lib_sysroot: PathBuf,
    app_root: PathBuf,
    sysroot_libs: Vec<PathBuf>,
}

impl Classifier {
    /// Index every `*.dylib` under `lib_sysroot` for `@rpath` lookups.
    pub fn new(lib_sysroot: &Path, app_root: &Path) -> Result<Self> {
        let mut sysroot_libs = Vec::new();
        for entry in WalkDir::new(lib_sysroot).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("walk vendored tree: {}", lib_sysroot.display()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.file_name().to_string_lossy().ends_with(".dylib") {
                sysroot_libs.push(entry.into_path());
            }
        }
        Ok(Self::with_index(lib_sysroot, app_root, sysroot_libs))
    }

    /// Build a classifier over an already collected vendored-library index.
    pub fn with_index(lib_sysroot: &Path, app_root: &Path, sysroot_libs: Vec<PathBuf>) -> Self {
        Self {
            lib_sysroot: lib_sysroot.to_path_buf(),
            app_root: app_root.to_path_buf(),
            sysroot_libs,
        }
    }

    pub fn lib_sysroot(&self) -> &Path {
        &self.lib_sysroot
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    /// Resolve a reference to a path and classify it.
    ///
    /// # Errors
    ///
    /// - [`RelocateError::UnresolvedReference`] if an `@rpath` reference has
    ///   no match in the vendored tree
    /// - [`RelocateError::UnforeseenLocation`] if the path is under none of
    ///   the vendored, application or system roots
    pub fn classify(&self, reference: &str) -> Result<Resolved> {
        let path = if has_rpath(reference) {
            self.find_rpath_lib(reference)?
        } else {
            PathBuf::from(reference)
        };

        let origin = if path.starts_with(&self.lib_sysroot) {
            Origin::Vendored
        } else if path.starts_with(&self.app_root) {
            Origin::Application
        } else if is_system(&path) {
            Origin::System
        } else {
            return Err(RelocateError::UnforeseenLocation { path }.into());
        };

        Ok(Resolved { path, origin })
    }

    /// First vendored library whose file name matches the `@rpath` reference.
    ///
    /// The index is sorted, so with duplicate names the winner is stable
    /// across runs.
    fn find_rpath_lib(&self, reference: &str) -> Result<PathBuf> {
        let name = reference
            .strip_prefix(RPATH_TOKEN)
            .unwrap_or(reference)
            .trim_start_matches('/');

        let mut matches = self
            .sysroot_libs
            .iter()
            .filter(|p| p.file_name().is_some_and(|n| n == name));

        let first = matches.next().ok_or_else(|| RelocateError::UnresolvedReference {
            reference: reference.to_string(),
            sysroot: self.lib_sysroot.clone(),
        })?;

        let others: Vec<&PathBuf> = matches.collect();
        if !others.is_empty() {
            warn!(
                "{} matches {} libraries, using {} (also: {:?})",
                reference,
                others.len() + 1,
                first.display(),
                others
            );
        }

        Ok(first.clone())
    }
}

/// Does the reference start with the `@rpath` placeholder?
pub fn has_rpath(reference: &str) -> bool {
    reference.starts_with(RPATH_TOKEN)
}

/// Is the path under one of the OS library prefixes?
pub fn is_system(path: &Path) -> bool {
    let path = path.to_string_lossy();
    SYSTEM_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}
