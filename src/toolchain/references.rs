//! Reference assemblies bundled with the host
//!
//! A build that does not come from a host-generated response file has to name
//! the core libraries itself. Each one is found by file name anywhere below a
//! directory of the host's contents.

use super::find_file;
use crate::error::{SesameError, SesameResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One reference assembly: file name and the contents subdirectory to search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSpec {
    pub file: String,
    pub under: PathBuf,
}

impl ReferenceSpec {
    pub fn new(file: impl Into<String>, under: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            under: under.into(),
        }
    }

    /// Engine core module plus the standard libraries
    pub fn defaults() -> Vec<ReferenceSpec> {
        vec![
            ReferenceSpec::new("UnityEngine.CoreModule.dll", "Managed/UnityEngine"),
            ReferenceSpec::new("netstandard.dll", "NetStandard"),
            ReferenceSpec::new("mscorlib.dll", "NetStandard"),
        ]
    }
}

/// Resolve every reference under `contents`, in order
pub fn find_references(contents: &Path, specs: &[ReferenceSpec]) -> SesameResult<Vec<PathBuf>> {
    specs
        .iter()
        .map(|spec| {
            let dir = contents.join(&spec.under);
            let found = find_file(&dir, &spec.file).ok_or_else(|| SesameError::ReferenceNotFound {
                file: spec.file.clone(),
                dir: dir.clone(),
            })?;
            debug!("Reference {}: {}", spec.file, found.display());
            Ok(found)
        })
        .collect()
}
