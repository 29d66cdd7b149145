//! Error types for Sesame
//!
//! All modules use `SesameResult<T>` as their return type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Sesame operations
pub type SesameResult<T> = Result<T, SesameError>;

/// Pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    ResolveToolchain,
    LocateResponseFile,
    Transform,
    Invoke,
    Stage,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolveToolchain => "resolve-toolchain",
            Self::LocateResponseFile => "locate-response-file",
            Self::Transform => "transform",
            Self::Invoke => "invoke",
            Self::Stage => "stage",
        };
        write!(f, "{}", name)
    }
}

/// All errors that can occur in Sesame
#[derive(Error, Debug)]
pub enum SesameError {
    // Package errors
    #[error("Package '{package_id}' is not found at {path}")]
    PackageNotFound { package_id: String, path: PathBuf },

    #[error("Package '{package_id}' installation failed")]
    PackageInstallFailed { package_id: String },

    #[error("Download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    // Toolchain errors
    #[error("Compiler package '{0}' does not contain csc.dll or csc.exe")]
    ToolchainNotFound(String),

    #[error("Host contents directory is not configured")]
    HostContentsMissing,

    #[error("Builtin C# compiler not found: {0}")]
    BuiltinCompilerNotFound(String),

    #[error("Reference assembly {file} not found under {dir}")]
    ReferenceNotFound { file: String, dir: PathBuf },

    #[error("{kind} runtime for '{package_id}' is not provided by the host")]
    RuntimeNotFound { package_id: String, kind: String },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    // Response file errors
    #[error("Response file for '{0}' is not found")]
    ResponseFileNotFound(String),

    #[error("Invalid assembly definition {path}: {reason}")]
    AsmdefInvalid { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error during {stage}: {context}")]
    StageIo {
        stage: BuildStage,
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with code {code}: {command}\n{output}")]
    ProcessFailed {
        command: String,
        code: i32,
        output: String,
    },

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SesameError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a process failure from captured streams, stderr first
    pub fn process_failed(command: impl Into<String>, code: i32, stderr: &str, stdout: &str) -> Self {
        Self::ProcessFailed {
            command: command.into(),
            code,
            output: format!("{}\n\n{}", stderr, stdout),
        }
    }

    /// Attribute a plain IO error to a pipeline stage
    pub fn at_stage(self, stage: BuildStage) -> Self {
        match self {
            Self::Io { context, source } => Self::StageIo {
                stage,
                context,
                source,
            },
            other => other,
        }
    }

    /// Pipeline stage this error is raised from, if it is tied to one
    pub fn stage(&self) -> Option<BuildStage> {
        match self {
            Self::PackageNotFound { .. }
            | Self::PackageInstallFailed { .. }
            | Self::Download { .. }
            | Self::ToolchainNotFound(_)
            | Self::HostContentsMissing
            | Self::BuiltinCompilerNotFound(_)
            | Self::ReferenceNotFound { .. }
            | Self::RuntimeNotFound { .. }
            | Self::UnsupportedPlatform(_) => Some(BuildStage::ResolveToolchain),
            Self::ResponseFileNotFound(_) => Some(BuildStage::LocateResponseFile),
            Self::ProcessFailed { .. } | Self::CommandFailed { .. } => Some(BuildStage::Invoke),
            Self::StageIo { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PackageInstallFailed { .. } => {
                Some("Check network access, or install the package manually into the cache directory")
            }
            Self::RuntimeNotFound { .. } => Some("Set [host] dotnet / mono in the configuration"),
            Self::HostContentsMissing
            | Self::BuiltinCompilerNotFound(_)
            | Self::ReferenceNotFound { .. } => {
                Some("Set [host] contents_dir to the host application's contents directory")
            }
            Self::ResponseFileNotFound(_) => {
                Some("Build the module once with the host build system so its response file exists")
            }
            Self::ConfigNotFound(_) => Some("Run: sesame config init"),
            _ => None,
        }
    }
}
