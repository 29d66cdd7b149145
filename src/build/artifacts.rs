//! Build artifacts and their promotion from staging
//!
//! A compile produces up to four files that share a base name. Promotion
//! copies each staged file that exists to its destination through a temp file
//! in the destination directory followed by a rename, so a destination is
//! either the old file or the complete new one. Optional artifacts the compile
//! did not produce are removed from the destination, so every file there
//! comes from the same compile.

use crate::error::{SesameError, SesameResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Paths of the files a compile may produce for one primary output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub primary: PathBuf,
    pub pdb: PathBuf,
    pub xml: PathBuf,
    pub ref_dll: PathBuf,
}

impl ArtifactSet {
    /// Derive sibling artifact paths by replacing the primary's extension
    pub fn for_primary(primary: &Path) -> Self {
        Self {
            primary: primary.to_path_buf(),
            pdb: primary.with_extension("pdb"),
            xml: primary.with_extension("xml"),
            ref_dll: primary.with_extension("ref.dll"),
        }
    }

    /// All artifact paths, primary first
    pub fn paths(&self) -> [&Path; 4] {
        [&self.primary, &self.pdb, &self.xml, &self.ref_dll]
    }

    /// Symbols, documentation and reference assembly
    pub fn optional(&self) -> [&Path; 3] {
        [&self.pdb, &self.xml, &self.ref_dll]
    }

    /// Artifact paths that currently exist on disk
    pub fn existing(&self) -> Vec<PathBuf> {
        self.paths()
            .into_iter()
            .filter(|p| p.is_file())
            .map(Path::to_path_buf)
            .collect()
    }

    /// Remove any artifacts left over from an earlier compile
    pub fn clear(&self) -> SesameResult<()> {
        for path in self.paths() {
            remove_stale(path)?;
        }
        Ok(())
    }

    /// Remove the optional artifacts, returning the ones that existed
    pub fn clear_optional(&self) -> SesameResult<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in self.optional() {
            if remove_stale(path)? {
                removed.push(path.to_path_buf());
            }
        }
        Ok(removed)
    }
}

/// Delete `path` if it exists
fn remove_stale(path: &Path) -> SesameResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale artifact {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SesameError::io(
            format!("removing stale artifact {}", path.display()),
            e,
        )),
    }
}

/// Outcome of promoting one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Unchanged,
    Missing,
}

/// Copy `src` over `dst` atomically, skipping a missing source or an identical destination
pub fn copy_if_needed(src: &Path, dst: &Path) -> SesameResult<CopyOutcome> {
    if !src.is_file() {
        return Ok(CopyOutcome::Missing);
    }

    let bytes = fs::read(src)
        .map_err(|e| SesameError::io(format!("reading staged artifact {}", src.display()), e))?;

    if dst.is_file() {
        let current = fs::read(dst)
            .map_err(|e| SesameError::io(format!("reading {}", dst.display()), e))?;
        if current == bytes {
            debug!("Unchanged: {}", dst.display());
            return Ok(CopyOutcome::Unchanged);
        }
    }

    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .map_err(|e| SesameError::io(format!("creating directory {}", dir.display()), e))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .map_err(|e| SesameError::io(format!("creating temp file in {}", dir.display()), e))?;
    tmp.write_all(&bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| SesameError::io(format!("writing temp file for {}", dst.display()), e))?;
    tmp.persist(dst)
        .map_err(|e| SesameError::io(format!("replacing {}", dst.display()), e.error))?;

    info!("Copied {} -> {}", src.display(), dst.display());
    Ok(CopyOutcome::Copied)
}

/// Final paths written, left untouched and deleted by a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub copied: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Optional artifacts of an earlier compile that this one did not produce
    pub removed: Vec<PathBuf>,
}

impl BuildReport {
    /// Every final artifact that exists after the build
    pub fn artifacts(&self) -> impl Iterator<Item = &PathBuf> {
        self.copied.iter().chain(self.unchanged.iter())
    }
}

/// Promote every staged artifact that exists to its final location and drop
/// destination artifacts the compile did not produce
///
/// The primary is never removed: a compile that exits successfully without
/// writing it leaves the previous one in place.
pub fn promote(staged: &ArtifactSet, target: &ArtifactSet) -> SesameResult<BuildReport> {
    let mut report = BuildReport::default();

    for (index, (src, dst)) in staged.paths().into_iter().zip(target.paths()).enumerate() {
        match copy_if_needed(src, dst)? {
            CopyOutcome::Copied => report.copied.push(dst.to_path_buf()),
            CopyOutcome::Unchanged => report.unchanged.push(dst.to_path_buf()),
            CopyOutcome::Missing => {
                debug!("Not produced: {}", src.display());
                if index > 0 && remove_stale(dst)? {
                    report.removed.push(dst.to_path_buf());
                }
            }
        }
    }

    Ok(report)
}
