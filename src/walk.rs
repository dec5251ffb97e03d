//! Dependency graph traversal.
//!
//! Every non-system edge is rewritten to `@rpath/<name>`. Each distinct
//! library is copied (if vendored), renamed and descended into once per run,
//! however many binaries reach it.

use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyze::get_library_references;
use crate::classify::{Classifier, Origin};
use crate::copy::copy_library_into;
use crate::rewrite::{change_reference, rpath_name, set_identity};
use crate::tool::MachoTool;

/// State shared by all traversal roots of one run.
#[derive(Debug, Default, Clone)]
pub struct WalkState {
    /// Resolved library paths (and roots) already processed.
    pub visited: HashSet<PathBuf>,
    /// Directories the entry points must carry as rpaths.
    pub search_roots: BTreeSet<PathBuf>,
    /// Destination paths of vendored libraries copied so far.
    pub copied: Vec<PathBuf>,
}

/// Walks binaries and rewrites their dependency references.
pub struct Relocator<'a> {
    tool: &'a dyn MachoTool,
    classifier: &'a Classifier,
    deps_dir: PathBuf,
}

impl<'a> Relocator<'a> {
    pub fn new(tool: &'a dyn MachoTool, classifier: &'a Classifier, deps_dir: &Path) -> Self {
        Self {
            tool,
            classifier,
            deps_dir: deps_dir.to_path_buf(),
        }
    }

    /// Relocate `root` and everything it transitively links against.
    ///
    /// Returns `false` without touching anything if `root` was already
    /// reached, either as an earlier root or as someone's dependency.
    pub fn relocate_root(&self, root: &Path, state: &mut WalkState) -> Result<bool> {
        if !state.visited.insert(root.to_path_buf()) {
            debug!("Skipping {} (already processed)", root.display());
            return Ok(false);
        }
        info!("Starting processing of main target {} ...", root.display());

        let mut to_process = vec![root.to_path_buf()];
        while let Some(current) = to_process.pop() {
            self.process_binary(&current, state, &mut to_process)?;
        }

        Ok(true)
    }

    /// Rewrite the edges of one binary and queue its unvisited dependencies.
    fn process_binary(
        &self,
        current: &Path,
        state: &mut WalkState,
        to_process: &mut Vec<PathBuf>,
    ) -> Result<()> {
        debug!("Processing {} ...", current.display());

        for reference in get_library_references(self.tool, current)? {
            debug!("-> Dependency {}", reference);
            let resolved = self.classifier.classify(&reference)?;
            if resolved.origin == Origin::System {
                continue;
            }

            let new_name = rpath_name(&resolved.path);
            change_reference(self.tool, current, &reference, &new_name)?;

            if !state.visited.insert(resolved.path.clone()) {
                continue;
            }

            let location = match resolved.origin {
                Origin::Vendored => {
                    state.search_roots.insert(self.deps_dir.clone());
                    let copied = copy_library_into(&resolved.path, &self.deps_dir)?;
                    state.copied.push(copied.clone());
                    copied
                }
                Origin::Application => {
                    if let Some(dir) = resolved.path.parent() {
                        state.search_roots.insert(dir.to_path_buf());
                    }
                    resolved.path
                }
                Origin::System => unreachable!("system libraries are skipped above"),
            };

            set_identity(self.tool, &location, &new_name)?;
            to_process.push(location);
        }

        Ok(())
    }
}
