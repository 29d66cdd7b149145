//! Archive extraction commands
//!
//! Extraction shells out to the host's archive tools: `7z` on Windows, `tar`
//! for tarballs elsewhere, and `7za` for zip-style archives such as `.nupkg`.

use crate::error::{SesameError, SesameResult};
use crate::platform::Platform;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Archive format, judged by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    /// zip container (`.zip`, `.nupkg`, anything unrecognised)
    Zip,
}

impl ArchiveKind {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else {
            ArchiveKind::Zip
        }
    }
}

/// A fully resolved extraction command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Directory that must exist before the command runs
    pub prepare_dir: PathBuf,
}

/// Resolve an archive tool: inside `tools_dir` when the host provides one, else on `PATH`
fn tool(name: &str, tools_dir: Option<&Path>) -> PathBuf {
    match tools_dir {
        Some(dir) => dir.join(name),
        None => which::which(name).unwrap_or_else(|_| PathBuf::from(name)),
    }
}

fn seven_zip(program: PathBuf, archive: &Path, dest: &Path) -> ExtractCommand {
    let mut out_flag = OsString::from("-o");
    out_flag.push(dest.as_os_str());
    ExtractCommand {
        program,
        args: vec!["x".into(), archive.as_os_str().to_owned(), out_flag],
        prepare_dir: dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Build the command that extracts `archive` into `dest` on `platform`
pub fn extract_command(
    archive: &Path,
    dest: &Path,
    platform: Platform,
    tools_dir: Option<&Path>,
) -> SesameResult<ExtractCommand> {
    match (platform, ArchiveKind::from_path(archive)) {
        (Platform::Windows, _) => Ok(seven_zip(tool("7z.exe", tools_dir), archive, dest)),
        (Platform::MacOS | Platform::Linux, ArchiveKind::TarGz) => Ok(ExtractCommand {
            program: PathBuf::from("tar"),
            args: vec![
                "-pzxf".into(),
                archive.as_os_str().to_owned(),
                "-C".into(),
                dest.as_os_str().to_owned(),
            ],
            prepare_dir: dest.to_path_buf(),
        }),
        (Platform::MacOS | Platform::Linux, ArchiveKind::Zip) => {
            Ok(seven_zip(tool("7za", tools_dir), archive, dest))
        }
        (Platform::Unsupported, _) => Err(SesameError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        )),
    }
}
