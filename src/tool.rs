//! External Mach-O tooling: `otool` for inspection, `install_name_tool` for patching.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Output};

use crate::error::RelocateError;

/// A single load-command edit applied in place by `install_name_tool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// `-change old new`
    Change { old: String, new: String },
    /// `-id name`
    Id(String),
    /// `-add_rpath path`
    AddRpath(String),
    /// `-delete_rpath path`
    DeleteRpath(String),
}

impl Edit {
    fn args(&self) -> Vec<&str> {
        match self {
            Edit::Change { old, new } => vec!["-change", old.as_str(), new.as_str()],
            Edit::Id(name) => vec!["-id", name.as_str()],
            Edit::AddRpath(path) => vec!["-add_rpath", path.as_str()],
            Edit::DeleteRpath(path) => vec!["-delete_rpath", path.as_str()],
        }
    }
}

/// Inspection and patching of Mach-O binaries.
///
/// The inspection methods return raw tool output; parsing lives in
/// the `analyze` module so every implementation shares it.
pub trait MachoTool {
    /// Output of `otool -L <binary>`.
    fn list_libraries(&self, binary: &Path) -> Result<String>;

    /// Output of `otool -l <binary>`.
    fn list_load_commands(&self, binary: &Path) -> Result<String>;

    /// Run `install_name_tool <edit> <binary>`.
    fn apply(&self, binary: &Path, edit: &Edit) -> Result<()>;
}

/// The Xcode command line tools found on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcodeTools;

impl MachoTool for XcodeTools {
    fn list_libraries(&self, binary: &Path) -> Result<String> {
        let output = Command::new("otool")
            .arg("-L")
            .arg(binary)
            .output()
            .context("otool command not found - install the Xcode command line tools")?;
        checked("otool", binary, output)
    }

    fn list_load_commands(&self, binary: &Path) -> Result<String> {
        let output = Command::new("otool")
            .arg("-l")
            .arg(binary)
            .output()
            .context("otool command not found - install the Xcode command line tools")?;
        checked("otool", binary, output)
    }

    fn apply(&self, binary: &Path, edit: &Edit) -> Result<()> {
        let output = Command::new("install_name_tool")
            .args(edit.args())
            .arg(binary)
            .output()
            .context("install_name_tool command not found - install the Xcode command line tools")?;
        checked("install_name_tool", binary, output).map(|_| ())
    }
}

fn checked(tool: &'static str, binary: &Path, output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(RelocateError::ToolFailed {
            tool,
            binary: binary.to_path_buf(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
