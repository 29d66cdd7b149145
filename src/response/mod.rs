//! Compiler response file rewriting
//!
//! A response file holds one compiler flag per line, each of the form
//! `<prefix><name>[:value]` where the prefix is `-` or `/`. Rewriting
//! redirects the output, applies the build options and writes the result to a
//! new file; the host-generated original is never modified.

pub mod dialect;
pub mod locate;

pub use dialect::{DialectPreset, OutputMode, ReleaseMode, ResponseFileDialect};
pub use locate::{PathTemplateLocator, ResponseFileLocator, ResponseFileLookup, TempScanLocator};

use crate::build::artifacts::ArtifactSet;
use crate::build::CompileOptions;
use crate::error::{SesameError, SesameResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A parsed flag line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag<'a> {
    pub prefix: char,
    pub name: &'a str,
    pub value: Option<&'a str>,
}

impl<'a> Flag<'a> {
    /// Parse a response file line; lines without a `-` or `/` prefix are not flags
    pub fn parse(line: &'a str) -> Option<Self> {
        let prefix = line.chars().next()?;
        if prefix != '-' && prefix != '/' {
            return None;
        }

        let rest = &line[1..];
        let (name, value) = match rest.find(':') {
            Some(colon) => (&rest[..colon], Some(&rest[colon + 1..])),
            None => (rest, None),
        };

        Some(Self {
            prefix,
            name,
            value,
        })
    }

    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Flag value with surrounding quotes removed
    pub fn unquoted_value(&self) -> Option<&'a str> {
        self.value.map(|v| v.trim().trim_matches('"'))
    }
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

/// Rewrite response file text so the compiler writes to `output`
pub fn transform_text(
    input: &str,
    output: &Path,
    options: CompileOptions,
    dialect: &ResponseFileDialect,
) -> String {
    let release = options.contains(CompileOptions::RELEASE);
    let optimize_mode = dialect.release == ReleaseMode::Optimize;

    let mut prefix = '-';
    let mut saw_out = false;
    let mut lines: Vec<String> = Vec::new();

    for line in input.trim_start_matches('\u{feff}').lines() {
        if line.trim().is_empty() {
            if !dialect.skip_blank_lines {
                lines.push(line.to_string());
            }
            continue;
        }

        let Some(flag) = Flag::parse(line) else {
            lines.push(line.to_string());
            continue;
        };

        let keep = if flag.is("out") {
            if dialect.preserve_prefix {
                prefix = flag.prefix;
            }
            saw_out = true;
            lines.push(format!("{}out:{}", prefix, quoted(output)));
            false
        } else if flag.is("debug") {
            !optimize_mode && !release
        } else if flag.is("optimize") || flag.is("optimize+") || flag.is("optimize-") {
            !optimize_mode
        } else if flag.is("analyzer") {
            options.contains(CompileOptions::ENABLE_ANALYZER)
        } else if flag.is("additionalfile") || flag.is("doc") || flag.is("refout") {
            false
        } else {
            !dialect.drops(flag.name)
        };

        if keep {
            lines.push(line.to_string());
        }
    }

    if !saw_out {
        debug!("Response file has no out flag, appending one");
        lines.push(format!("{}out:{}", prefix, quoted(output)));
    }

    if optimize_mode {
        if release {
            lines.push(format!("{}optimize", prefix));
        } else {
            lines.push(format!("{}debug:portable", prefix));
        }
    }

    let artifacts = ArtifactSet::for_primary(output);
    if options.contains(CompileOptions::XML_DOC) {
        lines.push(format!("{}doc:{}", prefix, quoted(&artifacts.xml)));
    }
    if options.contains(CompileOptions::REF_DLL) {
        lines.push(format!("{}refout:{}", prefix, quoted(&artifacts.ref_dll)));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Path of the rewritten copy that [`transform`] writes next to `src`
pub fn modified_path(src: &Path) -> PathBuf {
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    src.with_file_name(format!("mod_{}", name))
}

/// Rewrite `src` into `mod_<name>` alongside it and return the new path
pub fn transform(
    src: &Path,
    output: &Path,
    options: CompileOptions,
    dialect: &ResponseFileDialect,
) -> SesameResult<PathBuf> {
    let dst = modified_path(src);
    transform_to(src, &dst, output, options, dialect)?;
    Ok(dst)
}

/// Rewrite `src` into `dst`
pub fn transform_to(
    src: &Path,
    dst: &Path,
    output: &Path,
    options: CompileOptions,
    dialect: &ResponseFileDialect,
) -> SesameResult<()> {
    let input = fs::read_to_string(src)
        .map_err(|e| SesameError::io(format!("reading response file {}", src.display()), e))?;

    let text = transform_text(&input, output, options, dialect);

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| SesameError::io(format!("creating directory {}", parent.display()), e))?;
    }
    fs::write(dst, text)
        .map_err(|e| SesameError::io(format!("writing response file {}", dst.display()), e))?;

    debug!(
        "Rewrote response file {} -> {} ({})",
        src.display(),
        dst.display(),
        options
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RSP: &str = "-target:library\n\
        -out:\"Library/ScriptAssemblies/Foo.dll\"\n\
        -debug:portable\n\
        -optimize-\n\
        -analyzer:\"Analyzers/Foo.Analyzer.dll\"\n\
        -additionalfile:\"Assets/Foo.additionalfile\"\n\
        -doc:\"Library/Foo.xml\"\n\
        -refout:\"Library/Foo.ref.dll\"\n\
        -nowarn:0169\n\
        \n\
        \"Assets/Foo.cs\"\n";

    fn toolset() -> ResponseFileDialect {
        ResponseFileDialect::toolset()
    }

    #[test]
    fn parse_flag_with_and_without_value() {
        let flag = Flag::parse("-out:\"a.dll\"").unwrap();
        assert_eq!(flag.prefix, '-');
        assert_eq!(flag.name, "out");
        assert_eq!(flag.unquoted_value(), Some("a.dll"));

        let flag = Flag::parse("/unsafe").unwrap();
        assert_eq!(flag.prefix, '/');
        assert_eq!(flag.name, "unsafe");
        assert_eq!(flag.value, None);

        assert!(Flag::parse("\"Assets/Foo.cs\"").is_none());
        assert!(Flag::parse("").is_none());
    }

    #[test]
    fn release_drops_debug_and_rewrites_out() {
        let input = "-out:\"old.dll\"\n-debug:portable\n";
        let text = transform_text(input, Path::new("Temp/New.dll"), CompileOptions::RELEASE, &toolset());
        assert!(!text.contains("debug"));
        assert!(!text.contains("old.dll"));
        assert!(text.contains("-out:\"Temp/New.dll\""));
    }

    #[test]
    fn debug_kept_without_release() {
        let text = transform_text(RSP, Path::new("Temp/Foo.dll"), CompileOptions::NONE, &toolset());
        assert!(text.contains("-debug:portable"));
        assert!(text.contains("-optimize-"));
    }

    #[test]
    fn xml_doc_appends_doc_flag() {
        let text = transform_text(RSP, Path::new("Temp/Foo.dll"), CompileOptions::XML_DOC, &toolset());
        assert!(text.contains("-doc:\"Temp/Foo.xml\""));
        assert!(!text.contains("Library/Foo.xml"));
    }

    #[test]
    fn ref_dll_appends_refout_flag() {
        let text = transform_text(RSP, Path::new("Temp/Foo.dll"), CompileOptions::REF_DLL, &toolset());
        assert!(text.contains("-refout:\"Temp/Foo.ref.dll\""));
        assert!(!text.contains("Library/Foo.ref.dll"));
    }

    #[test]
    fn doc_and_refout_dropped_by_default() {
        let text = transform_text(RSP, Path::new("Temp/Foo.dll"), CompileOptions::NONE, &toolset());
        assert!(!text.contains("doc:"));
        assert!(!text.contains("refout:"));
        assert!(!text.contains("additionalfile"));
    }

    #[test]
    fn analyzer_kept_only_when_enabled() {
        let text = transform_text(RSP, Path::new("Foo.dll"), CompileOptions::NONE, &toolset());
        assert!(!text.contains("-analyzer:"));

        let text = transform_text(RSP, Path::new("Foo.dll"), CompileOptions::ENABLE_ANALYZER, &toolset());
        assert!(text.contains("-analyzer:\"Analyzers/Foo.Analyzer.dll\""));
    }

    #[test]
    fn source_lines_and_unknown_flags_copied() {
        let text = transform_text(RSP, Path::new("Foo.dll"), CompileOptions::NONE, &toolset());
        assert!(text.contains("-target:library\n"));
        assert!(text.contains("-nowarn:0169\n"));
        assert!(text.contains("\"Assets/Foo.cs\"\n"));
    }

    #[test]
    fn slash_prefix_carried_to_appended_flags() {
        let input = "/out:\"old.dll\"\n/debug:portable\n";
        let options = CompileOptions::XML_DOC | CompileOptions::REF_DLL;
        let text = transform_text(input, Path::new("Temp/Foo.dll"), options, &toolset());
        assert!(text.contains("/out:\"Temp/Foo.dll\""));
        assert!(text.contains("/doc:\"Temp/Foo.xml\""));
        assert!(text.contains("/refout:\"Temp/Foo.ref.dll\""));
    }

    #[test]
    fn legacy_dialect_appends_optimize_in_release() {
        let input = "/out:\"old.dll\"\n-debug:full\n-optimize-\n\n-unsafe\n";
        let text = transform_text(input, Path::new("Foo.dll"), CompileOptions::RELEASE, &ResponseFileDialect::legacy());
        assert_eq!(text, "-out:\"Foo.dll\"\n-unsafe\n-optimize\n");
    }

    #[test]
    fn legacy_dialect_appends_portable_debug_otherwise() {
        let input = "-out:\"old.dll\"\n-debug:full\n";
        let text = transform_text(input, Path::new("Foo.dll"), CompileOptions::NONE, &ResponseFileDialect::legacy());
        assert_eq!(text, "-out:\"Foo.dll\"\n-debug:portable\n");
    }

    #[test]
    fn blank_lines_preserved_by_toolset() {
        let input = "-out:\"a.dll\"\n\n-unsafe\n";
        let text = transform_text(input, Path::new("b.dll"), CompileOptions::NONE, &toolset());
        assert_eq!(text, "-out:\"b.dll\"\n\n-unsafe\n");
    }

    #[test]
    fn extra_drop_flags_honoured() {
        let mut dialect = toolset();
        dialect.drop_flags.push("nowarn".to_string());
        let text = transform_text(RSP, Path::new("Foo.dll"), CompileOptions::NONE, &dialect);
        assert!(!text.contains("nowarn"));
    }

    #[test]
    fn missing_out_flag_is_appended() {
        let text = transform_text("-unsafe\n", Path::new("Foo.dll"), CompileOptions::NONE, &toolset());
        assert_eq!(text, "-unsafe\n-out:\"Foo.dll\"\n");
    }

    #[test]
    fn leading_bom_ignored() {
        let input = "\u{feff}-out:\"a.dll\"\n";
        let text = transform_text(input, Path::new("b.dll"), CompileOptions::NONE, &toolset());
        assert_eq!(text, "-out:\"b.dll\"\n");
    }

    #[test]
    fn transform_writes_new_file_and_preserves_original() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("Foo.rsp");
        fs::write(&src, RSP).unwrap();

        let options = CompileOptions::RELEASE | CompileOptions::XML_DOC;
        let dst = transform(&src, Path::new("Temp/Foo.dll"), options, &toolset()).unwrap();

        assert_eq!(dst, dir.path().join("mod_Foo.rsp"));
        assert_eq!(fs::read_to_string(&src).unwrap(), RSP);

        let first = fs::read(&dst).unwrap();
        transform(&src, Path::new("Temp/Foo.dll"), options, &toolset()).unwrap();
        let second = fs::read(&dst).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn transform_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = transform(
            &dir.path().join("missing.rsp"),
            Path::new("Foo.dll"),
            CompileOptions::NONE,
            &toolset(),
        )
        .unwrap_err();
        assert!(matches!(err, SesameError::Io { .. }));
    }
}
