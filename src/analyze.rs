//! Mach-O load command inspection using otool.

use anyhow::{bail, Result};
use std::path::Path;

use crate::tool::MachoTool;

/// Extract the linked-library references of a Mach-O binary using `otool -L`.
///
/// The binary's own install name is not returned: `otool -L` lists it as the
/// first entry for dylibs, and it is recognized by file name.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - `otool` is not installed or exits non-zero (not a Mach-O file)
#[must_use = "library references should be processed"]
pub fn get_library_references(tool: &dyn MachoTool, binary_path: &Path) -> Result<Vec<String>> {
    if !binary_path.exists() {
        bail!("File does not exist: {}", binary_path.display());
    }

    let stdout = tool.list_libraries(binary_path)?;
    let file_name = binary_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(parse_otool_libraries(&stdout, &file_name))
}

/// Parse `otool -L` output into library references.
///
/// Example otool output:
/// ```text
/// /opt/octave/lib/liboctave.dylib:
///     /opt/octave/lib/liboctave.dylib (compatibility version 11.0.0, current version 11.0.0)
///     @rpath/libfftw3.3.dylib (compatibility version 10.0.0, current version 10.10.0)
///     /usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1319.0.0)
/// ```
///
/// Universal binaries repeat a `path (architecture x86_64):` header per slice;
/// those headers are skipped and repeated references collapse to one.
pub fn parse_otool_libraries(output: &str, binary_name: &str) -> Vec<String> {
    let mut libs: Vec<String> = Vec::new();

    for line in output.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() || line.ends_with(':') {
            continue;
        }

        let reference = strip_version_suffix(line);
        let base_name = Path::new(reference)
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if base_name == binary_name {
            continue;
        }

        if !libs.iter().any(|l| l == reference) {
            libs.push(reference.to_string());
        }
    }

    libs
}

fn strip_version_suffix(line: &str) -> &str {
    let cut = line
        .find(" (compatibility version")
        .or_else(|| line.rfind(" ("))
        .unwrap_or(line.len());
    line[..cut].trim()
}

/// Extract the `LC_RPATH` entries of a Mach-O binary using `otool -l`.
#[must_use = "search paths should be processed"]
pub fn get_search_paths(tool: &dyn MachoTool, binary_path: &Path) -> Result<Vec<String>> {
    if !binary_path.exists() {
        bail!("File does not exist: {}", binary_path.display());
    }
    let stdout = tool.list_load_commands(binary_path)?;
    Ok(parse_otool_rpaths(&stdout))
}

/// Parse `otool -l` output into the paths of its `LC_RPATH` commands.
///
/// Universal binaries list their load commands once per slice; an rpath
/// present in several slices is returned once, since `-delete_rpath` removes
/// it from all of them.
///
/// ```text
/// Load command 14
///           cmd LC_RPATH
///       cmdsize 32
///          path /opt/homebrew/lib (offset 12)
/// ```
pub fn parse_otool_rpaths(output: &str) -> Vec<String> {
    let mut rpaths: Vec<String> = Vec::new();
    let mut in_rpath = false;

    for line in output.lines() {
        let line = line.trim();
        if line.starts_with("Load command") {
            in_rpath = false;
        } else if let Some(cmd) = line.strip_prefix("cmd ") {
            in_rpath = cmd.trim() == "LC_RPATH";
        } else if in_rpath {
            if let Some(rest) = line.strip_prefix("path ") {
                let path = rest.rfind(" (offset").map_or(rest, |end| &rest[..end]).trim();
                if !rpaths.iter().any(|r| r == path) {
                    rpaths.push(path.to_string());
                }
                in_rpath = false;
            }
        }
    }

    rpaths
}
