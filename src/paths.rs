//! Binary discovery in the application tree and search-path computation.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Load-time anchor for search paths: the directory of the main executable.
pub const EXECUTABLE_PATH_TOKEN: &str = "@executable_path";

/// Thin and universal Mach-O magic numbers, as they appear on disk.
const MACHO_MAGICS: &[[u8; 4]] = &[
    [0xfe, 0xed, 0xfa, 0xce],
    [0xce, 0xfa, 0xed, 0xfe],
    [0xfe, 0xed, 0xfa, 0xcf],
    [0xcf, 0xfa, 0xed, 0xfe],
    [0xca, 0xfe, 0xba, 0xbe],
    [0xca, 0xfe, 0xba, 0xbf],
];

/// Only read the magic number of a file and check if it is a Mach-O file.
///
/// Unreadable or short files are not Mach-O.
pub fn is_macho(path: &Path) -> bool {
    let mut buf = [0u8; 4];
    match File::open(path).and_then(|mut f| f.read_exact(&mut buf)) {
        Ok(()) => MACHO_MAGICS.contains(&buf),
        Err(_) => false,
    }
}

/// Enumerate the binaries of the application tree that need relocating.
///
/// A regular file qualifies if it is executable and not a libtool `.la`
/// archive, or if it is an Octave module (`.oct`) or a dylib. Files that are
/// not Mach-O (shell scripts, for instance) are dropped. Symlinks are not
/// followed. The result is sorted.
pub fn candidate_binaries(app_root: &Path) -> Result<Vec<PathBuf>> {
    let mut binaries = Vec::new();

    for entry in WalkDir::new(app_root).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk application tree: {}", app_root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        let by_extension = name.ends_with(".oct") || name.ends_with(".dylib");
        let by_mode = !name.ends_with(".la")
            && entry
                .metadata()
                .with_context(|| format!("Failed to read metadata: {}", entry.path().display()))?
                .permissions()
                .mode()
                & 0o111
                != 0;

        if (by_extension || by_mode) && is_macho(entry.path()) {
            binaries.push(entry.into_path());
        }
    }

    Ok(binaries)
}

/// Find every Mach-O file under `app_root` named `name`, ignoring case.
///
/// Scripts sharing the name are not entry points. Returns an empty list if
/// there is no match.
#[must_use = "found entry points should be used"]
pub fn find_entry_points(app_root: &Path, name: &str) -> Result<Vec<PathBuf>> {
    let wanted = name.to_lowercase();
    let mut found = Vec::new();
    for entry in WalkDir::new(app_root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk application tree: {}", app_root.display()))?;
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().to_lowercase() == wanted
            && is_macho(entry.path())
        {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Express `search_root` relative to the directory holding `executable`,
/// anchored at `@executable_path`.
///
/// `/app/bin/octave` with `/app/lib` gives `@executable_path/../lib`.
pub fn search_path_entry(executable: &Path, search_root: &Path) -> Result<String> {
    let exe_dir = executable
        .parent()
        .with_context(|| format!("Executable has no parent: {}", executable.display()))?;
    let relative = pathdiff::diff_paths(search_root, exe_dir).with_context(|| {
        format!(
            "No relative path from {} to {}",
            exe_dir.display(),
            search_root.display()
        )
    })?;

    if relative.as_os_str().is_empty() {
        return Ok(format!("{}/.", EXECUTABLE_PATH_TOKEN));
    }
    Ok(format!("{}/{}", EXECUTABLE_PATH_TOKEN, relative.display()))
}
