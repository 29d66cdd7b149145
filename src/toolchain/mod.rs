//! Compiler toolchain discovery
//!
//! An installed compiler package ships either a `csc.dll` run by the managed
//! runtime or a `csc.exe` run by the legacy runtime. The managed build wins
//! when a package carries both. Hosts that bundle a compiler can be used
//! instead of a package; that compiler always runs on the managed runtime.

pub mod host;
pub mod references;

pub use host::{ConfiguredHost, HostEnvironment, BUILTIN_COMPILER_PATHS};
pub use references::{find_references, ReferenceSpec};

use crate::error::{SesameError, SesameResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Managed compiler entry point
const MANAGED_ENTRY: &str = "csc.dll";

/// Legacy compiler entry point
const LEGACY_ENTRY: &str = "csc.exe";

/// Label used in place of a package id for the host's own compiler
pub const BUILTIN_LABEL: &str = "builtin";

/// Where the compiler comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolchainSource {
    /// Installed compiler package, fetched on first use
    #[default]
    Package,
    /// Compiler bundled with the host application
    Builtin,
}

/// Runtime family a compiler entry needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    /// Cross-platform managed runtime (`dotnet`)
    Managed,
    /// Legacy runtime (`mono`)
    Legacy,
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeKind::Managed => write!(f, "Managed"),
            RuntimeKind::Legacy => write!(f, "Legacy"),
        }
    }
}

/// Compiler entry located in a package; an empty path means none was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    pub package_id: String,
    pub compiler: PathBuf,
    pub kind: RuntimeKind,
}

impl ToolchainInfo {
    fn invalid(package_id: &str) -> Self {
        Self {
            package_id: package_id.to_string(),
            compiler: PathBuf::new(),
            kind: RuntimeKind::Managed,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.compiler.as_os_str().is_empty()
    }

    /// Pair with the host runtime this entry needs
    pub fn with_runtime(self, host: &dyn HostEnvironment) -> SesameResult<ResolvedToolchain> {
        if !self.is_valid() {
            return Err(SesameError::ToolchainNotFound(self.package_id));
        }

        let runtime = match self.kind {
            RuntimeKind::Managed => host.managed_runtime_path(),
            RuntimeKind::Legacy => host.legacy_runtime_path(),
        };

        match runtime {
            Some(runtime) => Ok(ResolvedToolchain {
                compiler: self.compiler,
                kind: self.kind,
                runtime,
            }),
            None => Err(SesameError::RuntimeNotFound {
                package_id: self.package_id,
                kind: self.kind.to_string(),
            }),
        }
    }
}

/// A compiler entry together with the runtime that launches it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToolchain {
    pub compiler: PathBuf,
    pub kind: RuntimeKind,
    pub runtime: PathBuf,
}

/// First file named `name` under `dir`, walking in name order
pub(crate) fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(|entry| entry.into_path())
}

/// Finds compiler entry points inside installed packages
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolchainLocator;

impl ToolchainLocator {
    pub fn new() -> Self {
        Self
    }

    /// The host's bundled compiler, run by the managed runtime
    pub fn builtin(&self, host: &dyn HostEnvironment) -> SesameResult<ToolchainInfo> {
        let contents = host.contents_dir().ok_or(SesameError::HostContentsMissing)?;
        match host.builtin_compiler_path() {
            Some(compiler) => {
                debug!("Builtin compiler: {}", compiler.display());
                Ok(ToolchainInfo {
                    package_id: BUILTIN_LABEL.to_string(),
                    compiler,
                    kind: RuntimeKind::Managed,
                })
            }
            None => Err(SesameError::BuiltinCompilerNotFound(format!(
                "no {} under {}",
                BUILTIN_COMPILER_PATHS.join(" or "),
                contents.display()
            ))),
        }
    }

    /// Look for `csc.dll`, then `csc.exe`, anywhere under `package_dir`
    pub fn locate(&self, package_id: &str, package_dir: &Path) -> ToolchainInfo {
        let found = find_file(package_dir, MANAGED_ENTRY)
            .map(|path| (path, RuntimeKind::Managed))
            .or_else(|| find_file(package_dir, LEGACY_ENTRY).map(|path| (path, RuntimeKind::Legacy)));

        match found {
            Some((compiler, kind)) => {
                debug!("Compiler entry ({}): {}", kind, compiler.display());
                ToolchainInfo {
                    package_id: package_id.to_string(),
                    compiler,
                    kind,
                }
            }
            None => {
                debug!("No compiler entry under {}", package_dir.display());
                ToolchainInfo::invalid(package_id)
            }
        }
    }
}
