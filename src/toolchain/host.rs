//! Host environment lookups
//!
//! The runtimes that launch the compiler belong to the embedding host, not to
//! the compiler package. The embedding application answers these questions
//! through [`HostEnvironment`]. A host may also ship its own compiler and
//! reference assemblies inside its application contents directory.

use crate::platform::Platform;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a host keeps its own compiler, relative to its contents directory,
/// newest layout first
pub const BUILTIN_COMPILER_PATHS: [&str; 2] = ["DotNetSdkRoslyn/csc.dll", "Tools/Roslyn/csc.dll"];

/// What the embedding host provides to the build pipeline
pub trait HostEnvironment: Send + Sync {
    /// Cross-platform managed runtime (`dotnet`), if the host has one
    fn managed_runtime_path(&self) -> Option<PathBuf>;

    /// Legacy runtime (`mono`), if the host has one
    fn legacy_runtime_path(&self) -> Option<PathBuf>;

    /// Directory with archive tools (`7z.exe`, `7za`); `None` means look on `PATH`
    fn archive_tools_dir(&self) -> Option<PathBuf> {
        None
    }

    /// Host application contents directory holding its compiler and reference assemblies
    fn contents_dir(&self) -> Option<PathBuf> {
        None
    }

    /// Compiler shipped with the host
    fn builtin_compiler_path(&self) -> Option<PathBuf> {
        let contents = self.contents_dir()?;
        BUILTIN_COMPILER_PATHS
            .iter()
            .map(|rel| contents.join(rel))
            .find(|path| path.is_file())
    }
}

/// Host answers taken from configuration, falling back to `PATH`
#[derive(Debug, Clone, Default)]
pub struct ConfiguredHost {
    dotnet: Option<PathBuf>,
    mono: Option<PathBuf>,
    tools_dir: Option<PathBuf>,
    contents_dir: Option<PathBuf>,
    search_path: bool,
}

impl ConfiguredHost {
    pub fn new(dotnet: Option<PathBuf>, mono: Option<PathBuf>, tools_dir: Option<PathBuf>) -> Self {
        Self {
            dotnet,
            mono,
            tools_dir,
            contents_dir: None,
            search_path: true,
        }
    }

    pub fn with_contents_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.contents_dir = dir;
        self
    }

    /// Only use the configured paths, never `PATH`
    pub fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    fn resolve(&self, configured: Option<&Path>, program: &str) -> Option<PathBuf> {
        if let Some(path) = configured {
            return path.is_file().then(|| path.to_path_buf());
        }
        if !self.search_path {
            return None;
        }
        let name = format!("{}{}", program, Platform::detect().exe_suffix());
        let found = which::which(&name).ok();
        debug!("PATH lookup for {}: {:?}", name, found);
        found
    }
}

impl HostEnvironment for ConfiguredHost {
    fn managed_runtime_path(&self) -> Option<PathBuf> {
        self.resolve(self.dotnet.as_deref(), "dotnet")
    }

    fn legacy_runtime_path(&self) -> Option<PathBuf> {
        self.resolve(self.mono.as_deref(), "mono")
    }

    fn archive_tools_dir(&self) -> Option<PathBuf> {
        self.tools_dir.clone()
    }

    fn contents_dir(&self) -> Option<PathBuf> {
        self.contents_dir.clone()
    }
}
