//! Copying vendored libraries into the deps directory.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Make a file writable by its owner (u+w), leaving other bits alone.
///
/// Package managers install dylibs read-only; install_name_tool edits in place.
pub fn make_writable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?
        .permissions();
    perms.set_mode(perms.mode() | 0o200);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
    Ok(())
}

/// Copy a library into `dest_dir`, flattened to its file name.
///
/// Symlinks are dereferenced: the real file is copied under the link's name.
/// An existing file at the destination is overwritten.
pub fn copy_library_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .with_context(|| format!("Library path has no file name: {}", src.display()))?;
    let dest = dest_dir.join(name);

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create {}", dest_dir.display()))?;

    // A read-only leftover from an earlier run would refuse the overwrite.
    let read_only = dest.exists()
        && fs::metadata(&dest)
            .with_context(|| format!("Failed to read metadata: {}", dest.display()))?
            .permissions()
            .readonly();
    if dest.is_symlink() || read_only {
        fs::remove_file(&dest).with_context(|| format!("Failed to remove {}", dest.display()))?;
    }

    fs::copy(src, &dest)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
    make_writable(&dest)?;

    Ok(dest)
}
