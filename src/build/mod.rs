//! Build orchestration
//!
//! A build runs five stages in order and stops at the first failure:
//!
//! 1. resolve the compiler toolchain (installing the package on first use)
//! 2. locate the response file the host generated for the module
//! 3. rewrite it to point at the staging directory
//! 4. run the compiler
//! 5. promote the produced artifacts to their destination
//!
//! Destinations are only written after the compiler exits successfully, so a
//! failed compile leaves earlier output intact. Builds of the same output
//! must not run concurrently.
//!
//! A resource build follows the same stages but compiles a fixed directory
//! with its own response file instead of rewriting a host-generated one.

pub mod artifacts;
pub mod asmdef;
pub mod options;
pub mod resource;

pub use artifacts::{ArtifactSet, BuildReport};
pub use options::CompileOptions;
pub use resource::ResourceBuild;

use crate::error::{BuildStage, SesameError, SesameResult};
use crate::package::{HttpPackageSource, PackageFetcher, PackageSource};
use crate::process::ProcessRunner;
use crate::response::{self, OutputMode, ResponseFileDialect, ResponseFileLocator, ResponseFileLookup};
use crate::toolchain::{
    find_references, HostEnvironment, ResolvedToolchain, ToolchainInfo, ToolchainLocator,
    ToolchainSource,
};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a build needs to know, supplied by the embedding application
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    /// Installed package or the host's bundled compiler
    pub toolchain: ToolchainSource,
    /// Compiler package to install and use
    pub package_id: String,
    /// Package download URL, `{id}` replaced by the lower-cased id
    pub url_template: String,
    /// Shared package cache
    pub cache_dir: PathBuf,
    /// Host project root; compiler working directory and base for relative paths
    pub project_root: PathBuf,
    /// Scratch space for downloads, rewritten response files and staging
    pub scratch_dir: PathBuf,
    pub dialect: ResponseFileDialect,
    pub response_file: ResponseFileLookup,
    /// Skip certificate verification while downloading packages
    pub allow_insecure_tls: bool,
}

impl BuildConfiguration {
    fn resolve(&self, path: &Path) -> PathBuf {
        self.project_root.join(path)
    }

    pub fn scratch(&self) -> PathBuf {
        self.resolve(&self.scratch_dir)
    }

    pub fn cache(&self) -> PathBuf {
        self.resolve(&self.cache_dir)
    }
}

/// Composes package fetching, toolchain lookup, response file rewriting and
/// compiler invocation
pub struct BuildOrchestrator {
    config: BuildConfiguration,
    host: Arc<dyn HostEnvironment>,
    fetcher: PackageFetcher,
    toolchains: ToolchainLocator,
    locator: Box<dyn ResponseFileLocator>,
    runner: ProcessRunner,
}

impl BuildOrchestrator {
    /// Orchestrator that downloads packages over HTTP(S)
    pub fn new(config: BuildConfiguration, host: Arc<dyn HostEnvironment>) -> Self {
        let source = Arc::new(HttpPackageSource::new(config.allow_insecure_tls));
        Self::with_source(config, host, source)
    }

    /// Orchestrator with a custom package source
    pub fn with_source(
        config: BuildConfiguration,
        host: Arc<dyn HostEnvironment>,
        source: Arc<dyn PackageSource>,
    ) -> Self {
        let fetcher = PackageFetcher::new(
            config.cache(),
            config.scratch().join("downloads"),
            config.url_template.clone(),
            source,
        )
        .with_tools_dir(host.archive_tools_dir());
        let locator = config.response_file.locator(&config.project_root);
        let runner = ProcessRunner::new().with_working_dir(&config.project_root);

        Self {
            config,
            host,
            fetcher,
            toolchains: ToolchainLocator::new(),
            locator,
            runner,
        }
    }

    /// Replace the response file lookup strategy
    pub fn with_locator(mut self, locator: Box<dyn ResponseFileLocator>) -> Self {
        self.locator = locator;
        self
    }

    /// Replace the process runner used for the compiler and for extraction
    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.fetcher = self.fetcher.with_runner(runner.clone());
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    pub fn host(&self) -> &dyn HostEnvironment {
        self.host.as_ref()
    }

    pub fn fetcher(&self) -> &PackageFetcher {
        &self.fetcher
    }

    pub fn locator(&self) -> &dyn ResponseFileLocator {
        self.locator.as_ref()
    }

    /// Compiler entry from the configured source, installing the package on a miss
    pub async fn toolchain_info(&self) -> SesameResult<ToolchainInfo> {
        match self.config.toolchain {
            ToolchainSource::Package => {
                let package_dir = self.fetcher.resolve(&self.config.package_id).await?;
                Ok(self.toolchains.locate(&self.config.package_id, &package_dir))
            }
            ToolchainSource::Builtin => self.toolchains.builtin(self.host.as_ref()),
        }
    }

    /// Stage 1: compiler entry plus the runtime that launches it
    pub async fn resolve_toolchain(&self) -> SesameResult<ResolvedToolchain> {
        let info = self.toolchain_info().await?;
        let resolved = info.with_runtime(self.host.as_ref())?;
        debug!(
            "Toolchain: {} via {}",
            resolved.compiler.display(),
            resolved.runtime.display()
        );
        Ok(resolved)
    }

    /// Stage 2: the host-generated response file for `module`
    pub fn locate_response_file(&self, module: &str) -> SesameResult<PathBuf> {
        let found = self.locator.locate(module)?;
        match found {
            Some(path) => {
                debug!("Response file for {}: {}", module, path.display());
                Ok(path)
            }
            None => {
                debug!("No response file for {} ({})", module, self.locator.describe());
                Err(SesameError::ResponseFileNotFound(module.to_string()))
            }
        }
    }

    /// Where the primary artifact for `output` is compiled before promotion
    pub fn staging_primary(&self, output: &Path) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(output.to_string_lossy().as_bytes());
        let key = hex::encode(&hasher.finalize()[..6]);

        let file_name = output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("output.dll"));
        self.config
            .scratch()
            .join("staging")
            .join(key)
            .join(file_name)
    }

    /// Build `module` into `output`, returning the artifacts at their final paths
    pub async fn build(
        &self,
        module: &str,
        output: &Path,
        options: CompileOptions,
    ) -> SesameResult<BuildReport> {
        let target = ArtifactSet::for_primary(&self.config.project_root.join(output));
        info!(
            "Building {} -> {} ({})",
            module,
            target.primary.display(),
            options
        );

        let toolchain = self.resolve_toolchain().await?;
        let rsp = self.locate_response_file(module)?;

        let (compile_to, cleared) = self
            .prepare_output(&target)
            .map_err(|e| e.at_stage(BuildStage::Transform))?;

        let rsp_name = rsp
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.rsp", module));
        let modified = self
            .config
            .scratch()
            .join("responses")
            .join(format!("mod_{}", rsp_name));
        response::transform_to(
            &rsp,
            &modified,
            &compile_to.primary,
            options,
            &self.config.dialect,
        )
        .map_err(|e| e.at_stage(BuildStage::Transform))?;

        let mut rsp_arg = OsString::from("@");
        rsp_arg.push(modified.as_os_str());
        let args: Vec<OsString> = vec![
            toolchain.compiler.into_os_string(),
            OsString::from("/noconfig"),
            rsp_arg,
        ];
        self.runner
            .run(&toolchain.runtime, &args, Some(&self.config.project_root))
            .await?;

        let report = self.finish(&compile_to, &target, cleared)?;
        info!(
            "Built {} ({} written, {} unchanged, {} removed)",
            module,
            report.copied.len(),
            report.unchanged.len(),
            report.removed.len()
        );
        Ok(report)
    }

    /// Compile a resource directory into `output`
    ///
    /// The compiler runs in the resource directory with its response file as
    /// is; the output and reference assemblies are appended as arguments.
    pub async fn build_resources(
        &self,
        resources: &ResourceBuild,
        output: &Path,
    ) -> SesameResult<BuildReport> {
        let target = ArtifactSet::for_primary(&self.config.project_root.join(output));
        let dir = self.config.project_root.join(&resources.dir);
        info!(
            "Building resources {} -> {}",
            dir.display(),
            target.primary.display()
        );

        let toolchain = self.resolve_toolchain().await?;
        let references = if resources.references.is_empty() {
            Vec::new()
        } else {
            let contents = self
                .host
                .contents_dir()
                .ok_or(SesameError::HostContentsMissing)?;
            find_references(&contents, &resources.references)?
        };

        let rsp = dir.join(&resources.response_file);
        if !rsp.is_file() {
            debug!("No resource response file at {}", rsp.display());
            return Err(SesameError::ResponseFileNotFound(rsp.display().to_string()));
        }

        let (compile_to, cleared) = self
            .prepare_output(&target)
            .map_err(|e| e.at_stage(BuildStage::Transform))?;
        let out = std::path::absolute(&compile_to.primary).map_err(|e| {
            SesameError::io(format!("resolving {}", compile_to.primary.display()), e)
                .at_stage(BuildStage::Transform)
        })?;

        let args = resource::compiler_args(
            &toolchain.compiler,
            &resources.response_file,
            &out,
            &references,
        );
        self.runner.run(&toolchain.runtime, &args, Some(&dir)).await?;

        let report = self.finish(&compile_to, &target, cleared)?;
        info!(
            "Built resources ({} written, {} unchanged, {} removed)",
            report.copied.len(),
            report.unchanged.len(),
            report.removed.len()
        );
        Ok(report)
    }

    /// Where the compiler writes, plus destination artifacts removed up front
    ///
    /// Staged output compiles into a cleared staging set. Direct output
    /// compiles over the destination, so its optional artifacts are removed
    /// first and only files from this compile remain.
    fn prepare_output(&self, target: &ArtifactSet) -> SesameResult<(ArtifactSet, Vec<PathBuf>)> {
        let prepared = match self.config.dialect.output {
            OutputMode::Staged => {
                let staged = ArtifactSet::for_primary(&self.staging_primary(&target.primary));
                staged.clear()?;
                (staged, Vec::new())
            }
            OutputMode::Direct => (target.clone(), target.clear_optional()?),
        };
        ensure_parent(&prepared.0.primary)?;
        Ok(prepared)
    }

    /// Stage 5: promote staged output, or report what a direct compile left
    fn finish(
        &self,
        compile_to: &ArtifactSet,
        target: &ArtifactSet,
        cleared: Vec<PathBuf>,
    ) -> SesameResult<BuildReport> {
        match self.config.dialect.output {
            OutputMode::Staged => {
                artifacts::promote(compile_to, target).map_err(|e| e.at_stage(BuildStage::Stage))
            }
            OutputMode::Direct => {
                let copied = target.existing();
                let removed = cleared.into_iter().filter(|p| !copied.contains(p)).collect();
                Ok(BuildReport {
                    copied,
                    unchanged: Vec::new(),
                    removed,
                })
            }
        }
    }
}

fn ensure_parent(path: &Path) -> SesameResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                SesameError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }
    }
    Ok(())
}
