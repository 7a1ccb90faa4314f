use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::Path;

use log::{debug, info};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{MIMETYPE, PackageSource, StagingArea};
use crate::error::{Error, Result};

/// A package archive, optionally staged for editing.
///
/// Reads go to the zip until [`Archive::stage`] extracts every member into a
/// scratch directory; from then on all reads, listings and writes use the
/// staged copy and the zip is only consulted again by `save` through it.
pub struct Archive {
    zip: ZipArchive<PackageSource>,
    staging: Option<StagingArea>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("members", &self.zip.len())
            .field("staging", &self.staging)
            .finish()
    }
}

impl Archive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source = PackageSource::open(path.as_ref())?;
        Ok(Self {
            zip: ZipArchive::new(source)?,
            staging: None,
        })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self {
            zip: ZipArchive::new(PackageSource::from_bytes(bytes))?,
            staging: None,
        })
    }

    pub fn is_staged(&self) -> bool {
        self.staging.is_some()
    }

    pub fn staging(&self) -> Option<&StagingArea> {
        self.staging.as_ref()
    }

    /// Member names, directories excluded.
    pub fn list_names(&self) -> Result<Vec<String>> {
        if let Some(staging) = &self.staging {
            return staging.list();
        }
        Ok((0..self.zip.len())
            .filter_map(|i| self.zip.name_for_index(i))
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect())
    }

    /// A member's bytes, or `None` if there is no such member.
    pub fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        if let Some(staging) = &self.staging {
            return staging.read(name);
        }
        let mut file = match self.zip.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    /// Like [`Archive::read`], failing on a missing member.
    pub fn read_required(&mut self, name: &str) -> Result<Vec<u8>> {
        self.read(name)?
            .ok_or_else(|| Error::MissingMember(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        match &self.staging {
            Some(staging) => staging.contains(name),
            None => self.zip.index_for_name(name).is_some(),
        }
    }

    /// Extract every member into a staging directory. Idempotent.
    pub fn stage(&mut self) -> Result<&StagingArea> {
        if self.staging.is_none() {
            let staging = StagingArea::new()?;
            for i in 0..self.zip.len() {
                let mut file = self.zip.by_index(i)?;
                if file.is_dir() {
                    continue;
                }
                let name = file.name().to_string();
                let path = staging.member_path(&name)?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&path)?;
                io::copy(&mut file, &mut out)?;
            }
            debug!(
                "staged {} member(s) in {}",
                self.zip.len(),
                staging.path().display()
            );
            self.staging = Some(staging);
        }
        self.staging
            .as_ref()
            .ok_or(Error::NotStaged("stage"))
    }

    fn staged(&self, operation: &'static str) -> Result<&StagingArea> {
        self.staging.as_ref().ok_or(Error::NotStaged(operation))
    }

    /// Create or replace a member in the staging directory.
    pub fn write(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.staged("write")?.write(name, bytes)
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        self.staged("rename")?.rename(from, to)
    }

    /// Re-pack the current contents (staged or not) into a zip.
    pub fn write_zip<W: Write + Seek>(&mut self, writer: W) -> Result<W> {
        let names = self.list_names()?;
        let mut zip = ZipWriter::new(writer);
        for name in ordered_members(&names) {
            let bytes = self.read_required(name)?;
            zip.start_file(name, options_for(name))?;
            zip.write_all(&bytes)?;
        }
        Ok(zip.finish()?)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(self.write_zip(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Write the package to `path`, replacing any existing file only once
    /// the new archive is complete.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        let file = self.write_zip(tmp.reopen()?)?;
        file.sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        info!("saved {}", path.display());
        Ok(())
    }
}

/// `mimetype` first, then everything else in the given order.
fn ordered_members(names: &[String]) -> impl Iterator<Item = &str> {
    let mimetype = names.iter().filter(|n| *n == MIMETYPE);
    let rest = names.iter().filter(|n| *n != MIMETYPE);
    mimetype.chain(rest).map(String::as_str)
}

fn options_for(name: &str) -> SimpleFileOptions {
    let method = if name == MIMETYPE {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    SimpleFileOptions::default().compression_method(method)
}

/// Zip the files under `dir` into a new package at `dest`.
///
/// Member names are paths relative to `dir`; `mimetype` is stored first.
pub fn pack_dir(dir: &Path, dest: &Path) -> Result<()> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        names.push(name.join("/"));
    }

    let mut zip = ZipWriter::new(File::create(dest)?);
    for name in ordered_members(&names) {
        let bytes = fs::read(dir.join(name))?;
        zip.start_file(name, options_for(name))?;
        zip.write_all(&bytes)?;
    }
    zip.finish()?;
    debug!("packed {} member(s) from {}", names.len(), dir.display());
    Ok(())
}
