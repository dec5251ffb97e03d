//! Rpath normalization once the graph walk is complete.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::paths::find_entry_points;
use crate::rewrite::{add_search_path, clear_all_search_paths};
use crate::tool::MachoTool;

/// Strip every rpath from each binary so no build-time path survives.
///
/// Returns the total number of entries removed.
pub fn clear_rpaths(tool: &dyn MachoTool, binaries: &[PathBuf]) -> Result<usize> {
    let mut removed = 0;
    for binary in binaries {
        let n = clear_all_search_paths(tool, binary)?;
        if n > 0 {
            debug!("Cleared {} rpaths from {}", n, binary.display());
        }
        removed += n;
    }
    Ok(removed)
}

/// Add one `@executable_path`-relative rpath per search root to each named
/// entry point found under `app_root`.
///
/// Names that match nothing are skipped with a warning. Returns the
/// executables that were finalized.
pub fn add_rpaths_to_entry_points(
    tool: &dyn MachoTool,
    app_root: &Path,
    entry_points: &[String],
    search_roots: &BTreeSet<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let mut finalized = Vec::new();

    for name in entry_points {
        let executables = find_entry_points(app_root, name)?;
        if executables.is_empty() {
            warn!("Entry point {} not found in {}", name, app_root.display());
            continue;
        }

        for executable in executables {
            for root in search_roots {
                add_search_path(tool, &executable, root)?;
            }
            finalized.push(executable);
        }
    }

    Ok(finalized)
}
