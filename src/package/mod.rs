//! Compiler package installation
//!
//! Packages are installed once into a cache directory shared by every build
//! and reused for as long as their directory exists.
//!
//! # Layout
//!
//! | Path | Contents |
//! |------|----------|
//! | `<cache>/<package-id>/` | extracted package |
//! | `<scratch>/downloads/<file>` | last downloaded archive |

pub mod archive;
pub mod source;

pub use archive::{extract_command, ArchiveKind, ExtractCommand};
pub use source::{HttpPackageSource, PackageSource};

use crate::error::{SesameError, SesameResult};
use crate::platform::Platform;
use crate::process::ProcessRunner;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compiler package for hosts with a cross-platform runtime
pub const TOOLSET_PACKAGE_ID: &str = "OpenSesame.Net.Compilers.Toolset.4.0.1";

/// Compiler package for hosts with only the legacy runtime
pub const LEGACY_PACKAGE_ID: &str = "OpenSesame.Net.Compilers.4.0.1";

/// Default package URL; `{id}` is replaced by the lower-cased package id
pub const NUGET_URL_TEMPLATE: &str = "https://globalcdn.nuget.org/packages/{id}.nupkg";

/// A package and where it lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub id: String,
    pub url: String,
    pub install_dir: PathBuf,
}

impl PackageDescriptor {
    pub fn is_installed(&self) -> bool {
        self.install_dir.is_dir()
    }
}

/// Resolves package ids to installed directories, fetching on a cache miss
pub struct PackageFetcher {
    cache_root: PathBuf,
    download_dir: PathBuf,
    url_template: String,
    source: Arc<dyn PackageSource>,
    runner: ProcessRunner,
    platform: Platform,
    tools_dir: Option<PathBuf>,
}

impl PackageFetcher {
    pub fn new(
        cache_root: impl Into<PathBuf>,
        download_dir: impl Into<PathBuf>,
        url_template: impl Into<String>,
        source: Arc<dyn PackageSource>,
    ) -> Self {
        Self {
            cache_root: cache_root.into(),
            download_dir: download_dir.into(),
            url_template: url_template.into(),
            source,
            runner: ProcessRunner::new(),
            platform: Platform::detect(),
            tools_dir: None,
        }
    }

    /// Directory holding host-provided archive tools (`7z`, `7za`)
    pub fn with_tools_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tools_dir = dir;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Describe a package without touching the filesystem
    pub fn descriptor(&self, package_id: &str) -> SesameResult<PackageDescriptor> {
        validate_id(package_id)?;
        Ok(PackageDescriptor {
            id: package_id.to_string(),
            url: self
                .url_template
                .replace("{id}", &package_id.to_lowercase()),
            install_dir: self.cache_root.join(package_id),
        })
    }

    /// Installed directory for `package_id`, downloading and extracting it on a miss
    pub async fn resolve(&self, package_id: &str) -> SesameResult<PathBuf> {
        let package = self.descriptor(package_id)?;
        if package.is_installed() {
            debug!("Package cache hit: {}", package.install_dir.display());
            return Ok(package.install_dir);
        }

        info!("Installing package {}", package.id);
        if let Err(e) = self.install(&package).await {
            warn!("Package '{}' installation failed: {}", package.id, e);
            discard_partial(&package.install_dir);
            return Err(SesameError::PackageInstallFailed {
                package_id: package.id,
            });
        }

        if !package.is_installed() {
            return Err(SesameError::PackageNotFound {
                package_id: package.id,
                path: package.install_dir,
            });
        }

        info!(
            "Package '{}' has been installed at {}",
            package.id,
            package.install_dir.display()
        );
        Ok(package.install_dir)
    }

    async fn install(&self, package: &PackageDescriptor) -> SesameResult<()> {
        let archive = self.download(package).await?;
        self.extract(&archive, &package.install_dir).await
    }

    async fn download(&self, package: &PackageDescriptor) -> SesameResult<PathBuf> {
        let file_name = package
            .url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(&package.id);
        let archive = self.download_dir.join(file_name);

        fs::create_dir_all(&self.download_dir).map_err(|e| {
            SesameError::io(format!("creating directory {}", self.download_dir.display()), e)
        })?;
        if archive.exists() {
            fs::remove_file(&archive)
                .map_err(|e| SesameError::io(format!("removing {}", archive.display()), e))?;
        }

        info!("Download {} to {}", package.url, archive.display());
        let bytes = self.source.download(&package.url, &archive).await?;
        debug!("Downloaded {} bytes", bytes);
        Ok(archive)
    }

    async fn extract(&self, archive: &Path, dest: &Path) -> SesameResult<()> {
        info!("Extract archive {} to {}", archive.display(), dest.display());
        let cmd = extract_command(archive, dest, self.platform, self.tools_dir.as_deref())?;

        fs::create_dir_all(&cmd.prepare_dir).map_err(|e| {
            SesameError::io(format!("creating directory {}", cmd.prepare_dir.display()), e)
        })?;

        self.runner.run(&cmd.program, &cmd.args, None).await?;
        Ok(())
    }

    /// Packages currently present in the cache
    pub fn installed(&self) -> SesameResult<Vec<PackageDescriptor>> {
        let entries = match fs::read_dir(&self.cache_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SesameError::io(
                    format!("reading cache {}", self.cache_root.display()),
                    e,
                ))
            }
        };

        let mut packages = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            if !entry.path().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match self.descriptor(&id) {
                Ok(package) => packages.push(package),
                Err(e) => debug!("Skipping cache entry {}: {}", entry.path().display(), e),
            }
        }
        packages.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(packages)
    }

    /// Delete an installed package so the next resolve fetches it again
    pub fn remove(&self, package_id: &str) -> SesameResult<bool> {
        let package = self.descriptor(package_id)?;
        if !package.is_installed() {
            return Ok(false);
        }
        fs::remove_dir_all(&package.install_dir).map_err(|e| {
            SesameError::io(format!("removing {}", package.install_dir.display()), e)
        })?;
        info!("Removed package {}", package.id);
        Ok(true)
    }
}

/// Package ids become directory names; refuse anything that could escape the cache
fn validate_id(package_id: &str) -> SesameResult<()> {
    let valid = !package_id.is_empty()
        && package_id != "."
        && package_id != ".."
        && !package_id.contains(['/', '\\', ':']);
    if valid {
        Ok(())
    } else {
        Err(SesameError::User(format!("Invalid package id: '{}'", package_id)))
    }
}

fn discard_partial(dir: &Path) {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!("Could not remove partial install {}: {}", dir.display(), e);
        }
    }
}
