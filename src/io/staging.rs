use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::Result;

/// Scratch directory holding an editable copy of every package member.
///
/// Removed from disk when dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("galley-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// On-disk location of member `name`.
    ///
    /// Member names are relative `/`-separated paths; anything escaping the
    /// staging directory is rejected.
    pub fn member_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let safe = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid member name {name:?}"),
            )
            .into());
        }
        Ok(self.dir.path().join(relative))
    }

    /// Member names, sorted, `/`-separated.
    pub fn list(&self) -> Result<Vec<String>> {
        let root = self.dir.path();
        let mut names = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let name: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            names.push(name.join("/"));
        }
        Ok(names)
    }

    pub fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.member_path(name)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.member_path(name).is_ok_and(|p| p.is_file())
    }

    /// Create or replace a member, creating parent directories as needed.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.member_path(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.member_path(from)?;
        let target = self.member_path(to)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(source, target)?;
        Ok(())
    }
}
