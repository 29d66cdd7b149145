//! A throwaway host project with a fake compiler package
//!
//! The "compiler" is a shell script saved as `csc.dll` and the managed
//! runtime is `/bin/sh`, so `runtime csc.dll /noconfig @rsp` runs the script.
//! It reads the response file and writes each artifact it names.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PACKAGE_ID: &str = "OpenSesame.Net.Compilers.Toolset.4.0.1";

pub const FAKE_COMPILER: &str = r#"#!/bin/sh
rsp=""
for arg in "$@"; do
  case "$arg" in
    @*) rsp="${arg#@}" ;;
  esac
done
if [ -z "$rsp" ]; then
  echo "no response file" >&2
  exit 2
fi
value() {
  sed -n 's|^[-/]'"$1"':"\(.*\)"$|\1|p' "$rsp" | head -n 1
}
out=$(value out)
printf 'assembly' > "$out"
if grep -q '^[-/]debug' "$rsp"; then
  printf 'symbols' > "${out%.dll}.pdb"
fi
doc=$(value doc)
if [ -n "$doc" ]; then
  printf '<doc/>' > "$doc"
fi
ref=$(value refout)
if [ -n "$ref" ]; then
  printf 'reference' > "$ref"
fi
echo "compiled $out"
exit 0
"#;

pub const FAILING_COMPILER: &str = r#"#!/bin/sh
echo "Foo.cs(3,10): error CS1002: ; expected" >&2
echo "Compilation failed: 1 error(s)"
exit 1
"#;

/// Bundled host compiler: checks its response file is relative to the
/// working directory and records it with the references in the output
pub const RESOURCE_COMPILER: &str = r#"#!/bin/sh
rsp=""
out=""
refs=""
for arg in "$@"; do
  case "$arg" in
    @*) rsp="${arg#@}" ;;
    -out:*) out="${arg#-out:}" ;;
    -r:*) refs="$refs ${arg#-r:}" ;;
  esac
done
if [ ! -f "$rsp" ]; then
  echo "no $rsp in $(pwd)" >&2
  exit 2
fi
{ cat "$rsp"; echo "refs:$refs"; } > "$out"
exit 0
"#;

pub const RESPONSE_FILE: &str = "-target:library\n\
-out:\"Library/ScriptAssemblies/Foo.dll\"\n\
-debug:portable\n\
-optimize-\n\
-analyzer:\"Analyzers/Foo.Analyzer.dll\"\n\
-additionalfile:\"Assets/csc.rsp\"\n\
\"Assets/Foo/Foo.cs\"\n";

pub struct Project {
    pub dir: TempDir,
}

impl Project {
    /// Project with the compiler package already in the cache
    pub fn new(compiler: &str) -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        project.write(
            &format!(
                "Library/InstalledPackages/{}/tasks/netcore/bincore/csc.dll",
                PACKAGE_ID
            ),
            compiler,
        );
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Response file where the host build would leave it for `module`
    pub fn add_response_file(&self, module: &str) {
        self.write(
            &format!("Library/Bee/artifacts/1900b0aE.dag/{}.rsp", module),
            RESPONSE_FILE,
        );
    }

    /// Host contents directory with a bundled compiler and reference assemblies
    pub fn add_host_contents(&self, compiler: &str) -> PathBuf {
        self.write("Host/Data/DotNetSdkRoslyn/csc.dll", compiler);
        self.write("Host/Data/Managed/UnityEngine/UnityEngine.CoreModule.dll", "");
        self.write("Host/Data/NetStandard/ref/2.1.0/netstandard.dll", "");
        self.write("Host/Data/NetStandard/compat/shims/mscorlib.dll", "");
        self.path("Host/Data")
    }

    /// Local config pointing the managed runtime at `/bin/sh`
    pub fn write_local_config(&self, extra: &str) {
        self.write(
            ".sesame.toml",
            &format!("[host]\ndotnet = \"/bin/sh\"\n\n{}", extra),
        );
    }
}
