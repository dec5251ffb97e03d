//! A file-backed stand-in for otool / install_name_tool.
//!
//! Fixture binaries are a Mach-O magic number followed by text lines
//! (`id`, `dep`, `rpath`), so copying a fixture copies its load commands.

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::cell::RefCell;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use macho_relocate::{Edit, MachoTool, RelocateError};

pub const MAGIC: [u8; 4] = [0xcf, 0xfa, 0xed, 0xfe];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeBinary {
    pub id: Option<String>,
    pub deps: Vec<String>,
    pub rpaths: Vec<String>,
}

impl FakeBinary {
    pub fn dylib(id: &str, deps: &[&str]) -> Self {
        Self {
            id: Some(id.to_string()),
            deps: deps.iter().map(|s| s.to_string()).collect(),
            rpaths: Vec::new(),
        }
    }

    pub fn executable(deps: &[&str]) -> Self {
        Self {
            id: None,
            deps: deps.iter().map(|s| s.to_string()).collect(),
            rpaths: Vec::new(),
        }
    }

    pub fn with_rpaths(mut self, rpaths: &[&str]) -> Self {
        self.rpaths = rpaths.iter().map(|s| s.to_string()).collect();
        self
    }

    fn encode(&self) -> Vec<u8> {
        let mut text = String::new();
        if let Some(id) = &self.id {
            text.push_str(&format!("id {}\n", id));
        }
        for dep in &self.deps {
            text.push_str(&format!("dep {}\n", dep));
        }
        for rpath in &self.rpaths {
            text.push_str(&format!("rpath {}\n", rpath));
        }
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 || bytes[..4] != MAGIC {
            return None;
        }
        let mut binary = FakeBinary::default();
        for line in String::from_utf8_lossy(&bytes[4..]).lines() {
            if let Some(id) = line.strip_prefix("id ") {
                binary.id = Some(id.to_string());
            } else if let Some(dep) = line.strip_prefix("dep ") {
                binary.deps.push(dep.to_string());
            } else if let Some(rpath) = line.strip_prefix("rpath ") {
                binary.rpaths.push(rpath.to_string());
            }
        }
        Some(binary)
    }
}

/// Write a fixture binary, creating parent directories.
pub fn write_binary(path: &Path, binary: &FakeBinary, mode: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, binary.encode()).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

pub fn read_binary(path: &Path) -> FakeBinary {
    FakeBinary::decode(&fs::read(path).unwrap()).expect("fixture is not a fake Mach-O")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListLibraries(PathBuf),
    ListLoadCommands(PathBuf),
    Apply(PathBuf, Edit),
}

/// Records every invocation and edits fixtures in place.
#[derive(Debug, Default)]
pub struct FakeTool {
    pub calls: RefCell<Vec<Call>>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the dependencies of `path` were listed.
    pub fn inspections_of(&self, path: &Path) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::ListLibraries(p) if p == path))
            .count()
    }

    pub fn edits_of(&self, path: &Path) -> Vec<Edit> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Apply(p, edit) if p == path => Some(edit.clone()),
                _ => None,
            })
            .collect()
    }

    fn load(&self, tool: &'static str, path: &Path) -> Result<FakeBinary> {
        let bytes = fs::read(path).unwrap_or_default();
        FakeBinary::decode(&bytes).ok_or_else(|| {
            RelocateError::ToolFailed {
                tool,
                binary: path.to_path_buf(),
                status: "exit status: 1".to_string(),
                stderr: "is not an object file".to_string(),
            }
            .into()
        })
    }
}

impl MachoTool for FakeTool {
    fn list_libraries(&self, binary: &Path) -> Result<String> {
        self.calls
            .borrow_mut()
            .push(Call::ListLibraries(binary.to_path_buf()));
        let fake = self.load("otool", binary)?;

        let mut out = format!("{}:\n", binary.display());
        for lib in fake.id.iter().chain(fake.deps.iter()) {
            out.push_str(&format!(
                "\t{} (compatibility version 1.0.0, current version 1.0.0)\n",
                lib
            ));
        }
        Ok(out)
    }

    fn list_load_commands(&self, binary: &Path) -> Result<String> {
        self.calls
            .borrow_mut()
            .push(Call::ListLoadCommands(binary.to_path_buf()));
        let fake = self.load("otool", binary)?;

        let mut out = format!("{}:\n", binary.display());
        for (i, rpath) in fake.rpaths.iter().enumerate() {
            out.push_str(&format!(
                "Load command {}\n          cmd LC_RPATH\n      cmdsize 32\n         path {} (offset 12)\n",
                i, rpath
            ));
        }
        Ok(out)
    }

    fn apply(&self, binary: &Path, edit: &Edit) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::Apply(binary.to_path_buf(), edit.clone()));
        let mut fake = self.load("install_name_tool", binary)?;

        match edit {
            Edit::Change { old, new } => {
                for dep in fake.deps.iter_mut().filter(|d| d.as_str() == old.as_str()) {
                    *dep = new.clone();
                }
            }
            Edit::Id(id) => fake.id = Some(id.clone()),
            Edit::AddRpath(path) => {
                if fake.rpaths.contains(path) {
                    bail!("would duplicate path, file already has LC_RPATH for: {}", path);
                }
                fake.rpaths.push(path.clone());
            }
            Edit::DeleteRpath(path) => {
                let Some(pos) = fake.rpaths.iter().position(|r| r == path) else {
                    bail!("no LC_RPATH load command with path: {}", path);
                };
                fake.rpaths.remove(pos);
            }
        }

        fs::write(binary, fake.encode())?;
        Ok(())
    }
}
