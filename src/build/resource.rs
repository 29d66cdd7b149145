//! Builds from a fixed resource directory
//!
//! A resource build does not reuse a host-generated response file. The
//! directory carries its own hand-written response file listing sources
//! relative to it; the output path and reference assemblies are passed on the
//! command line.

use crate::toolchain::ReferenceSpec;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Response file name used when none is configured
pub const DEFAULT_RESOURCE_RSP: &str = "rsp";

/// A resource directory to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBuild {
    /// Compiler working directory
    pub dir: PathBuf,
    /// Response file, relative to `dir`
    pub response_file: PathBuf,
    /// Reference assemblies to pass explicitly
    pub references: Vec<ReferenceSpec>,
}

impl ResourceBuild {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            response_file: PathBuf::from(DEFAULT_RESOURCE_RSP),
            references: ReferenceSpec::defaults(),
        }
    }

    pub fn with_response_file(mut self, response_file: impl Into<PathBuf>) -> Self {
        self.response_file = response_file.into();
        self
    }

    pub fn with_references(mut self, references: Vec<ReferenceSpec>) -> Self {
        self.references = references;
        self
    }

    pub fn response_path(&self) -> PathBuf {
        self.dir.join(&self.response_file)
    }
}

/// Compiler arguments: `<compiler> @<rsp> -out:<output> -r:<reference>...`
pub fn compiler_args(
    compiler: &Path,
    response_file: &Path,
    output: &Path,
    references: &[PathBuf],
) -> Vec<OsString> {
    let mut rsp = OsString::from("@");
    rsp.push(response_file.as_os_str());
    let mut out = OsString::from("-out:");
    out.push(output.as_os_str());

    let mut args = vec![compiler.as_os_str().to_owned(), rsp, out];
    args.extend(references.iter().map(|reference| {
        let mut arg = OsString::from("-r:");
        arg.push(reference.as_os_str());
        arg
    }));
    args
}
