//! Finding the response file the host build generated for a module
//!
//! Newer hosts put response files at a predictable path; older ones leave
//! them as anonymous temp files, so the only way to find the right one is to
//! read each candidate's `out` flag.

use super::Flag;
use crate::error::{SesameError, SesameResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Strategy for locating a module's response file
pub trait ResponseFileLocator: Send + Sync {
    /// Find the response file for `module`, `None` when there is none
    fn locate(&self, module: &str) -> SesameResult<Option<PathBuf>>;

    /// Short description for logs and the CLI
    fn describe(&self) -> String;
}

/// Lookup strategy as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ResponseFileLookup {
    /// Deterministic path formula
    Template { template: String },
    /// Newest matching temp file
    Scan { dir: PathBuf, prefix: String },
}

impl Default for ResponseFileLookup {
    fn default() -> Self {
        ResponseFileLookup::Template {
            template: "Library/Bee/artifacts/*.dag/{module}.rsp".to_string(),
        }
    }
}

impl ResponseFileLookup {
    /// Build the locator, resolving relative paths against `project_root`
    pub fn locator(&self, project_root: &Path) -> Box<dyn ResponseFileLocator> {
        match self {
            ResponseFileLookup::Template { template } => {
                Box::new(PathTemplateLocator::new(project_root, template.clone()))
            }
            ResponseFileLookup::Scan { dir, prefix } => {
                Box::new(TempScanLocator::new(project_root.join(dir), prefix.clone()))
            }
        }
    }
}

/// Locates `<root>/<template>` with `{module}` substituted
///
/// A path component containing `*` matches any directory entry with the same
/// text around the star. Every match is followed, and of the resulting paths
/// that are files the most recently modified wins.
#[derive(Debug, Clone)]
pub struct PathTemplateLocator {
    root: PathBuf,
    template: String,
}

impl PathTemplateLocator {
    pub fn new(root: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            template: template.into(),
        }
    }

    fn expand(&self, module: &str) -> PathBuf {
        self.root.join(self.template.replace("{module}", module))
    }
}

impl ResponseFileLocator for PathTemplateLocator {
    fn locate(&self, module: &str) -> SesameResult<Option<PathBuf>> {
        let pattern = self.expand(module);
        let mut candidates = vec![PathBuf::new()];

        for component in pattern.components() {
            let text = component.as_os_str().to_string_lossy();
            match component {
                Component::Normal(_) if text.contains('*') => {
                    let mut expanded = Vec::new();
                    for dir in &candidates {
                        expanded.extend(matching_entries(dir, &text)?);
                    }
                    candidates = expanded;
                }
                _ => {
                    for candidate in &mut candidates {
                        candidate.push(component.as_os_str());
                    }
                }
            }
            if candidates.is_empty() {
                return Ok(None);
            }
        }

        debug!("Response file candidates: {:?}", candidates);
        Ok(newest_file(candidates))
    }

    fn describe(&self) -> String {
        format!("template {}", self.root.join(&self.template).display())
    }
}

/// Entries of `dir` matching a single-star `pattern`
fn matching_entries(dir: &Path, pattern: &str) -> SesameResult<Vec<PathBuf>> {
    let (head, tail) = pattern.split_once('*').unwrap_or((pattern, ""));
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SesameError::io(format!("reading directory {}", dir.display()), e)),
    };

    Ok(entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.len() >= head.len() + tail.len() && name.starts_with(head) && name.ends_with(tail)
        })
        .map(|entry| entry.path())
        .collect())
}

/// Most recently modified of `paths` that is a file
fn newest_file(paths: Vec<PathBuf>) -> Option<PathBuf> {
    let mut files: Vec<(SystemTime, PathBuf)> = paths
        .into_iter()
        .filter_map(|path| {
            let meta = fs::metadata(&path).ok()?;
            if !meta.is_file() {
                return None;
            }
            Some((meta.modified().unwrap_or(SystemTime::UNIX_EPOCH), path))
        })
        .collect();

    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    files.into_iter().next().map(|(_, path)| path)
}

/// Scans `dir` for files named `<prefix>*` and picks the newest whose `out`
/// flag names the module
#[derive(Debug, Clone)]
pub struct TempScanLocator {
    dir: PathBuf,
    prefix: String,
}

impl TempScanLocator {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    fn candidates(&self) -> SesameResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SesameError::io(
                    format!("reading directory {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&self.prefix))
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                if !meta.is_file() {
                    return None;
                }
                let created = meta
                    .created()
                    .or_else(|_| meta.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                Some((created, entry.path()))
            })
            .collect();

        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }
}

/// Output file stem named by the first `out` flag of a response file
fn output_stem(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path)
        .map_err(|e| debug!("Skipping unreadable {}: {}", path.display(), e))
        .ok()?;

    let value = content
        .lines()
        .filter_map(Flag::parse)
        .find(|flag| flag.is("out"))?
        .unquoted_value()?
        .to_string();

    Path::new(&value)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

impl ResponseFileLocator for TempScanLocator {
    fn locate(&self, module: &str) -> SesameResult<Option<PathBuf>> {
        let candidates = self.candidates()?;
        debug!(
            "Scanning {} response file candidates in {}",
            candidates.len(),
            self.dir.display()
        );

        Ok(candidates
            .into_iter()
            .find(|path| output_stem(path).as_deref() == Some(module)))
    }

    fn describe(&self) -> String {
        format!("scan {}/{}*", self.dir.display(), self.prefix)
    }
}
