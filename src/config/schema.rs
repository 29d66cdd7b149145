//! Configuration schema for Sesame
//!
//! Configuration is stored at `~/.config/sesame/config.toml`; a project may
//! override any of it in a `.sesame.toml`.

use crate::build::resource::DEFAULT_RESOURCE_RSP;
use crate::build::{asmdef, BuildConfiguration, CompileOptions, ResourceBuild};
use crate::error::{SesameError, SesameResult};
use crate::package::{NUGET_URL_TEMPLATE, TOOLSET_PACKAGE_ID};
use crate::response::{DialectPreset, OutputMode, ResponseFileDialect, ResponseFileLookup};
use crate::toolchain::{ConfiguredHost, ReferenceSpec, ToolchainSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Compiler package settings
    pub toolchain: ToolchainConfig,

    /// Build pipeline settings
    pub build: BuildConfig,

    /// Host runtime and tool locations
    pub host: HostConfig,

    /// Resource directory build
    pub resource: ResourceConfig,

    /// Assemblies built by `build-all`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assemblies: Vec<AssemblyEntry>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Compiler package settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// "package" or "builtin" (the host's bundled compiler)
    pub source: ToolchainSource,

    /// Package providing the compiler
    pub package_id: String,

    /// Download URL; `{id}` is replaced by the lower-cased package id
    pub url_template: String,

    /// Package cache, relative to the project root unless absolute
    pub cache_dir: PathBuf,

    /// Skip certificate verification while downloading packages
    pub allow_insecure_tls: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            source: ToolchainSource::Package,
            package_id: TOOLSET_PACKAGE_ID.to_string(),
            url_template: NUGET_URL_TEMPLATE.to_string(),
            cache_dir: PathBuf::from("Library/InstalledPackages"),
            allow_insecure_tls: true,
        }
    }
}

/// Build pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Host project root; defaults to the working directory
    pub project_root: Option<PathBuf>,

    /// Scratch directory, relative to the project root unless absolute
    pub scratch_dir: PathBuf,

    /// Response file dialect preset
    pub dialect: DialectPreset,

    /// Compile straight to the destination instead of staging
    pub direct_output: bool,

    /// Additional flags to drop from response files
    pub drop_flags: Vec<String>,

    /// How to find a module's response file
    pub response_file: ResponseFileLookup,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            scratch_dir: PathBuf::from("Temp/sesame"),
            dialect: DialectPreset::Toolset,
            direct_output: false,
            drop_flags: Vec::new(),
            response_file: ResponseFileLookup::default(),
        }
    }
}

/// Host runtime and tool locations; unset runtimes are looked up on `PATH`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Managed runtime executable (`dotnet`)
    pub dotnet: Option<PathBuf>,

    /// Legacy runtime executable (`mono`)
    pub mono: Option<PathBuf>,

    /// Directory containing `7z.exe` / `7za`
    pub tools_dir: Option<PathBuf>,

    /// Host application contents, with its bundled compiler and reference assemblies
    pub contents_dir: Option<PathBuf>,
}

impl HostConfig {
    /// Host lookups with relative paths resolved against `project_root`
    pub fn host(&self, project_root: &Path) -> ConfiguredHost {
        let resolve = |path: &Option<PathBuf>| path.as_ref().map(|p| project_root.join(p));
        ConfiguredHost::new(
            resolve(&self.dotnet),
            resolve(&self.mono),
            resolve(&self.tools_dir),
        )
        .with_contents_dir(resolve(&self.contents_dir))
    }
}

/// Resource directory build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Directory compiled by `sesame resource`, relative to the project root
    pub dir: Option<PathBuf>,

    /// Response file inside the directory
    pub response_file: PathBuf,

    /// Output dll, relative to the project root
    pub output: Option<PathBuf>,

    /// Reference assemblies searched under the host contents directory
    pub references: Vec<ReferenceSpec>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            dir: None,
            response_file: PathBuf::from(DEFAULT_RESOURCE_RSP),
            output: None,
            references: ReferenceSpec::defaults(),
        }
    }
}

impl ResourceConfig {
    /// Resource build for `dir`, falling back to the configured directory
    pub fn build(&self, dir: Option<&Path>) -> SesameResult<ResourceBuild> {
        let dir = dir.or(self.dir.as_deref()).ok_or_else(|| {
            SesameError::User("No resource directory. Pass --dir or set [resource] dir".to_string())
        })?;
        Ok(ResourceBuild::new(dir)
            .with_response_file(&self.response_file)
            .with_references(self.references.clone()))
    }
}

/// One assembly to build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyEntry {
    /// Module name as the host compiles it
    pub module: Option<String>,

    /// Assembly definition file naming the module
    pub asmdef: Option<PathBuf>,

    /// Output dll; derived from the asmdef when unset
    pub output: Option<PathBuf>,

    /// Compile options
    pub options: CompileOptions,
}

impl AssemblyEntry {
    /// Module name and output path, resolving asmdef paths against `root`
    pub fn resolve(&self, root: &Path) -> SesameResult<(String, PathBuf)> {
        let asmdef = self.asmdef.as_ref().map(|p| root.join(p));

        let module = match (&self.module, &asmdef) {
            (Some(module), _) => module.clone(),
            (None, Some(path)) => asmdef::assembly_name(path)?,
            (None, None) => {
                return Err(SesameError::User(
                    "Assembly entry needs a module or an asmdef".to_string(),
                ))
            }
        };

        let output = match (&self.output, &asmdef) {
            (Some(output), _) => root.join(output),
            (None, Some(path)) => asmdef::default_output_path(path, &module),
            (None, None) => {
                return Err(SesameError::User(format!(
                    "Assembly '{}' has no output path",
                    module
                )))
            }
        };

        Ok((module, output))
    }
}

impl Config {
    /// Project root: configured value resolved against `base_dir`, else `base_dir`
    pub fn project_root(&self, base_dir: &Path) -> PathBuf {
        match &self.build.project_root {
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        }
    }

    /// Response file dialect from preset, output mode and extra dropped flags
    pub fn dialect(&self) -> ResponseFileDialect {
        let mut dialect = self.build.dialect.dialect();
        if self.build.direct_output {
            dialect = dialect.with_output(OutputMode::Direct);
        }
        dialect.drop_flags.extend(self.build.drop_flags.iter().cloned());
        dialect
    }

    /// Pipeline configuration with paths resolved against the project root
    pub fn build_configuration(&self, base_dir: &Path) -> BuildConfiguration {
        let project_root = self.project_root(base_dir);
        BuildConfiguration {
            toolchain: self.toolchain.source,
            package_id: self.toolchain.package_id.clone(),
            url_template: self.toolchain.url_template.clone(),
            cache_dir: project_root.join(&self.toolchain.cache_dir),
            scratch_dir: project_root.join(&self.build.scratch_dir),
            dialect: self.dialect(),
            response_file: self.build.response_file.clone(),
            allow_insecure_tls: self.toolchain.allow_insecure_tls,
            project_root,
        }
    }
}
