//! Fatal failure categories of a relocation run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the whole run.
///
/// Library functions return `anyhow::Result`; these are the variants callers
/// may want to tell apart via `downcast_ref`.
#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("library {reference} not found in {}", sysroot.display())]
    UnresolvedReference { reference: String, sysroot: PathBuf },

    #[error("unforeseen location of library {}", path.display())]
    UnforeseenLocation { path: PathBuf },

    #[error("{tool} failed on {} ({status}): {stderr}", binary.display())]
    ToolFailed {
        tool: &'static str,
        binary: PathBuf,
        status: String,
        stderr: String,
    },
}
