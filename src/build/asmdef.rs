//! Assembly definition files
//!
//! An assembly definition is a small JSON document whose `name` field is the
//! module name the host build system compiles it as.

use crate::error::{SesameError, SesameResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct AssemblyDefinition {
    #[serde(default)]
    name: String,
}

/// Module name declared by the assembly definition at `path`
pub fn assembly_name(path: &Path) -> SesameResult<String> {
    let text = fs::read_to_string(path)
        .map_err(|e| SesameError::io(format!("reading assembly definition {}", path.display()), e))?;

    let definition: AssemblyDefinition = serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|e| SesameError::AsmdefInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if definition.name.is_empty() {
        return Err(SesameError::AsmdefInvalid {
            path: path.to_path_buf(),
            reason: "missing \"name\"".to_string(),
        });
    }
    Ok(definition.name)
}

/// Output path next to the assembly definition
///
/// When the file is named after the assembly, `.mod.dll` keeps the rebuilt
/// dll from colliding with the one the host produces.
pub fn default_output_path(asmdef: &Path, assembly_name: &str) -> PathBuf {
    let same = asmdef
        .file_stem()
        .is_some_and(|stem| stem.to_string_lossy() == assembly_name);
    asmdef.with_extension(if same { "mod.dll" } else { "dll" })
}
