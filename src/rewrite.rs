//! In-place load command edits.
//!
//! Each operation is idempotent: applying a value the binary already carries
//! leaves it unchanged.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use crate::analyze::get_search_paths;
use crate::classify::RPATH_TOKEN;
use crate::paths::search_path_entry;
use crate::tool::{Edit, MachoTool};

/// The relocatable form of a library reference: `@rpath/<file name>`.
pub fn rpath_name(library: &Path) -> String {
    let name = library
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!("{}/{}", RPATH_TOKEN, name)
}

/// Point `binary`'s reference `old` at `new`.
pub fn change_reference(tool: &dyn MachoTool, binary: &Path, old: &str, new: &str) -> Result<()> {
    debug!("change {} -> {} in {}", old, new, binary.display());
    tool.apply(
        binary,
        &Edit::Change {
            old: old.to_string(),
            new: new.to_string(),
        },
    )
}

/// Set a library's own install name.
pub fn set_identity(tool: &dyn MachoTool, binary: &Path, id: &str) -> Result<()> {
    debug!("id {} for {}", id, binary.display());
    tool.apply(binary, &Edit::Id(id.to_string()))
}

/// Delete every `LC_RPATH` entry of `binary`.
///
/// Returns the number of entries removed.
pub fn clear_all_search_paths(tool: &dyn MachoTool, binary: &Path) -> Result<usize> {
    let rpaths = get_search_paths(tool, binary)?;
    for rpath in &rpaths {
        debug!("delete rpath {} from {}", rpath, binary.display());
        tool.apply(binary, &Edit::DeleteRpath(rpath.clone()))?;
    }
    Ok(rpaths.len())
}

/// Add `directory` as an `@executable_path`-relative rpath of `executable`.
///
/// Returns the entry that was added.
pub fn add_search_path(tool: &dyn MachoTool, executable: &Path, directory: &Path) -> Result<String> {
    let entry = search_path_entry(executable, directory)?;
    debug!("add rpath {} to {}", entry, executable.display());
    tool.apply(executable, &Edit::AddRpath(entry.clone()))?;
    Ok(entry)
}
