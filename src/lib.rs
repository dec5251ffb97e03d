//! Mach-O relocation utilities.
//!
//! Rewrites the load commands of an application's binaries so they reference
//! their libraries through `@rpath` instead of absolute build-time paths.
//! Libraries from the vendored dependency tree are copied next to the bundle;
//! libraries from the application tree are renamed in place. Uses `otool` to
//! read load commands and `install_name_tool` to edit them.

mod analyze;
mod bundle;
mod classify;
mod config;
mod copy;
mod error;
mod finalize;
mod paths;
mod rewrite;
mod tool;
mod walk;

pub use analyze::{get_library_references, get_search_paths, parse_otool_libraries, parse_otool_rpaths};
pub use bundle::{relocate_bundle, RelocationReport};
pub use classify::{has_rpath, is_system, Classifier, Origin, Resolved, RPATH_TOKEN, SYSTEM_PREFIXES};
pub use config::{RelocateConfig, DEFAULT_ENTRY_POINTS};
pub use copy::{copy_library_into, make_writable};
pub use error::RelocateError;
pub use finalize::{add_rpaths_to_entry_points, clear_rpaths};
pub use paths::{candidate_binaries, find_entry_points, is_macho, search_path_entry, EXECUTABLE_PATH_TOKEN};
pub use rewrite::{add_search_path, change_reference, clear_all_search_paths, rpath_name, set_identity};
pub use tool::{Edit, MachoTool, XcodeTools};
pub use walk::{Relocator, WalkState};
