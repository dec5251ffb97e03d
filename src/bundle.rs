//! The full relocation pass over an application tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::classify::Classifier;
use crate::config::RelocateConfig;
use crate::finalize::{add_rpaths_to_entry_points, clear_rpaths};
use crate::paths::candidate_binaries;
use crate::tool::MachoTool;
use crate::walk::{Relocator, WalkState};

/// Outcome of [`relocate_bundle`].
#[derive(Debug, Default)]
pub struct RelocationReport {
    /// Candidate binaries processed as traversal roots.
    pub roots: usize,
    /// Libraries copied into the deps directory.
    pub copied: Vec<PathBuf>,
    /// Rpath entries removed across all candidate binaries.
    pub rpaths_removed: usize,
    /// Directories added as rpaths to every entry point.
    pub search_roots: Vec<PathBuf>,
    /// Entry-point executables that received the rpaths.
    pub entry_points: Vec<PathBuf>,
}

/// Make every binary under `config.app_root` relocatable.
///
/// Walks each candidate binary, copying vendored dependencies into
/// `config.deps_dir`, then clears all rpaths and re-adds the collected search
/// roots on the entry points. The first fatal error aborts the run.
pub fn relocate_bundle(tool: &dyn MachoTool, config: &RelocateConfig) -> Result<RelocationReport> {
    fs::create_dir_all(&config.deps_dir)
        .with_context(|| format!("Failed to create {}", config.deps_dir.display()))?;

    let classifier = Classifier::new(&config.lib_sysroot, &config.app_root)?;
    let relocator = Relocator::new(tool, &classifier, &config.deps_dir);
    let mut state = WalkState::default();
    let mut report = RelocationReport::default();

    for binary in candidate_binaries(&config.app_root)? {
        if relocator.relocate_root(&binary, &mut state)? {
            report.roots += 1;
        }
    }

    info!("Clearing rpaths ...");
    let binaries = candidate_binaries(&config.app_root)?;
    report.rpaths_removed = clear_rpaths(tool, &binaries)?;

    info!("Adding rpaths {:?} ...", state.search_roots);
    report.entry_points = add_rpaths_to_entry_points(
        tool,
        &config.app_root,
        &config.entry_points,
        &state.search_roots,
    )?;

    report.copied = state.copied;
    report.search_roots = state.search_roots.into_iter().collect();
    Ok(report)
}
