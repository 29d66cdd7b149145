//! Command line behaviour

use crate::fixtures::{Project, FAKE_COMPILER, PACKAGE_ID, RESOURCE_COMPILER, RESPONSE_FILE};
use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// `sesame` run in `dir` with an empty global config
fn sesame_in(dir: &std::path::Path) -> Command {
    let global = dir.join("global.toml");
    if !global.exists() {
        fs::write(&global, "").unwrap();
    }
    let mut cmd = cargo_bin_cmd!("sesame");
    cmd.current_dir(dir).arg("--config").arg(global);
    cmd
}

#[test]
fn help_displays() {
    cargo_bin_cmd!("sesame")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("out-of-band C# assembly builder"));
}

#[test]
fn version_displays() {
    cargo_bin_cmd!("sesame")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sesame"));
}

#[test]
fn completions_generate() {
    cargo_bin_cmd!("sesame")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sesame"));
}

#[test]
fn missing_explicit_config_is_reported() {
    let dir = TempDir::new().unwrap();
    cargo_bin_cmd!("sesame")
        .current_dir(dir.path())
        .args(["--config", "nope.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"))
        .stderr(predicate::str::contains("sesame config init"));
}

#[test]
fn config_path() {
    let dir = TempDir::new().unwrap();
    sesame_in(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("global.toml"));
}

#[test]
fn config_show_includes_local_overrides() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".sesame.toml"),
        "[toolchain]\npackage_id = \"OpenSesame.Net.Compilers.4.0.1\"\n",
    )
    .unwrap();

    sesame_in(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[toolchain]"))
        .stdout(predicate::str::contains("OpenSesame.Net.Compilers.4.0.1"));

    sesame_in(dir.path())
        .args(["--no-local", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(PACKAGE_ID));
}

#[test]
fn config_init_local() {
    let dir = TempDir::new().unwrap();
    sesame_in(dir.path())
        .args(["config", "init", "--local"])
        .assert()
        .success();

    let written = fs::read_to_string(dir.path().join(".sesame.toml")).unwrap();
    assert!(written.contains("[build]"));
}

#[test]
fn rsp_rewrites_next_to_source() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Foo.rsp"), RESPONSE_FILE).unwrap();

    sesame_in(dir.path())
        .args(["rsp", "Foo.rsp", "--out", "Temp/Foo.dll", "--xml-doc", "--release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mod_Foo.rsp"));

    let rewritten = fs::read_to_string(dir.path().join("mod_Foo.rsp")).unwrap();
    assert!(rewritten.contains("Temp/Foo.xml"));
    assert!(!rewritten.contains("-debug"));
    assert_eq!(fs::read_to_string(dir.path().join("Foo.rsp")).unwrap(), RESPONSE_FILE);
}

#[test]
fn rsp_print_leaves_disk_alone() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Foo.rsp"), RESPONSE_FILE).unwrap();

    sesame_in(dir.path())
        .args(["rsp", "Foo.rsp", "--out", "Out/Foo.dll", "--dialect", "legacy", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-debug:portable"))
        .stdout(predicate::str::contains("Out/Foo.dll"));

    assert!(!dir.path().join("mod_Foo.rsp").exists());
}

#[test]
fn build_without_output_fails() {
    let dir = TempDir::new().unwrap();
    sesame_in(dir.path())
        .args(["build", "Coffee.Foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No output path"));
}

#[test]
fn cache_list_empty() {
    let dir = TempDir::new().unwrap();
    sesame_in(dir.path())
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages installed"));
}

#[cfg(unix)]
mod project {
    use super::*;

    #[test]
    fn build_without_response_file_names_stage() {
        let project = Project::new(FAKE_COMPILER);
        project.write_local_config("");

        sesame_in(project.root())
            .args(["build", "Coffee.Foo", "--out", "Out/Foo.dll"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error [locate-response-file]"))
            .stderr(predicate::str::contains("Coffee.Foo"));
    }

    #[test]
    fn build_produces_output() {
        let project = Project::new(FAKE_COMPILER);
        project.write_local_config("");
        project.add_response_file("Coffee.Foo");

        sesame_in(project.root())
            .args(["build", "Coffee.Foo", "--out", "Out/Foo.dll", "--ref-dll"])
            .assert()
            .success();

        assert!(project.path("Out/Foo.dll").is_file());
        assert!(project.path("Out/Foo.ref.dll").is_file());
    }

    #[test]
    fn build_all_uses_asmdef_entries() {
        let project = Project::new(FAKE_COMPILER);
        project.write_local_config(
            "[[assemblies]]\nasmdef = \"Assets/Foo/Coffee.Foo.asmdef\"\noptions = [\"release\"]\n",
        );
        project.write("Assets/Foo/Coffee.Foo.asmdef", r#"{"name": "Coffee.Foo"}"#);
        project.add_response_file("Coffee.Foo");

        sesame_in(project.root())
            .arg("build-all")
            .assert()
            .success()
            .stdout(predicate::str::contains("Coffee.Foo"));

        assert!(project.path("Assets/Foo/Coffee.Foo.mod.dll").is_file());
        assert!(!project.path("Assets/Foo/Coffee.Foo.mod.pdb").exists());
    }

    #[test]
    fn cache_list_shows_installed_package() {
        let project = Project::new(FAKE_COMPILER);

        sesame_in(project.root())
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains(PACKAGE_ID));
    }

    #[test]
    fn toolchain_reports_managed_entry() {
        let project = Project::new(FAKE_COMPILER);
        project.write_local_config("");

        sesame_in(project.root())
            .arg("toolchain")
            .assert()
            .success()
            .stdout(predicate::str::contains("csc.dll"))
            .stdout(predicate::str::contains("Managed"));
    }

    #[test]
    fn toolchain_marks_missing_runtime() {
        let project = Project::new(FAKE_COMPILER);
        project.write(".sesame.toml", "[host]\ndotnet = \"Tools/dotnet\"\n");

        sesame_in(project.root())
            .arg("toolchain")
            .assert()
            .failure()
            .stdout(predicate::str::contains("[OK] Compiler"))
            .stdout(predicate::str::contains("[WARN] Runtime: not found"))
            .stderr(predicate::str::contains("Error [resolve-toolchain]"));
    }

    #[test]
    fn resource_build_with_bundled_compiler() {
        let project = Project::new(FAKE_COMPILER);
        project.add_host_contents(RESOURCE_COMPILER);
        project.write("Packages/res/R~/rsp", "R.cs\n");
        project.write_local_config(
            "contents_dir = \"Host/Data\"\n\n[resource]\ndir = \"Packages/res/R~\"\noutput = \"Out/R.dll\"\n",
        );

        sesame_in(project.root())
            .args(["resource", "--builtin"])
            .assert()
            .success();

        let built = fs::read_to_string(project.path("Out/R.dll")).unwrap();
        assert!(built.contains("R.cs"));
        assert!(built.contains("netstandard.dll"));
    }
}
