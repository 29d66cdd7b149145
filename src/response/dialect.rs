//! Response file dialects
//!
//! Compiler toolsets disagree on how a release build is expressed and on
//! whether flag prefixes may be `/`. A dialect captures those choices so a
//! single transform serves both generations.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a release build is expressed in the rewritten response file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseMode {
    /// Drop `debug` lines in release builds, keep them otherwise
    StripDebug,
    /// Always drop `debug`/`optimize` lines, then append `-optimize` or `-debug:portable`
    Optimize,
}

/// Where the compiler writes its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Compile into a scratch directory and promote artifacts after success
    Staged,
    /// Compile straight to the destination; a failed compile may clobber it
    Direct,
}

/// Named dialect presets, as selected on the command line or in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DialectPreset {
    Toolset,
    Legacy,
}

impl DialectPreset {
    pub fn dialect(self) -> ResponseFileDialect {
        match self {
            DialectPreset::Toolset => ResponseFileDialect::toolset(),
            DialectPreset::Legacy => ResponseFileDialect::legacy(),
        }
    }
}

/// Rules for rewriting a response file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseFileDialect {
    /// Release handling
    pub release: ReleaseMode,

    /// Reuse the `-`/`/` prefix seen on the `out` line for appended flags
    pub preserve_prefix: bool,

    /// Drop empty lines instead of copying them
    pub skip_blank_lines: bool,

    /// Output staging
    pub output: OutputMode,

    /// Additional flag names to drop unconditionally
    pub drop_flags: Vec<String>,
}

impl ResponseFileDialect {
    /// Dialect for the cross-platform compiler toolset
    pub fn toolset() -> Self {
        Self {
            release: ReleaseMode::StripDebug,
            preserve_prefix: true,
            skip_blank_lines: false,
            output: OutputMode::Staged,
            drop_flags: Vec::new(),
        }
    }

    /// Dialect for the older framework compiler package
    pub fn legacy() -> Self {
        Self {
            release: ReleaseMode::Optimize,
            preserve_prefix: false,
            skip_blank_lines: true,
            output: OutputMode::Staged,
            drop_flags: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Whether a flag is listed in `drop_flags`
    pub(crate) fn drops(&self, name: &str) -> bool {
        self.drop_flags.iter().any(|f| f.eq_ignore_ascii_case(name))
    }
}

impl Default for ResponseFileDialect {
    fn default() -> Self {
        Self::toolset()
    }
}
