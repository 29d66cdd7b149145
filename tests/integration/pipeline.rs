//! End-to-end builds through the library API with a fake compiler

use crate::fixtures::{Project, FAILING_COMPILER, FAKE_COMPILER, PACKAGE_ID, RESOURCE_COMPILER};
use async_trait::async_trait;
use sesame::build::{BuildConfiguration, BuildOrchestrator, CompileOptions, ResourceBuild};
use sesame::error::{BuildStage, SesameError, SesameResult};
use sesame::package::{PackageFetcher, PackageSource};
use sesame::response::{OutputMode, ResponseFileDialect, ResponseFileLookup};
use sesame::toolchain::{ConfiguredHost, ToolchainSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Serves one prepared archive and counts requests
struct CountingSource {
    archive: PathBuf,
    calls: AtomicUsize,
}

#[async_trait]
impl PackageSource for CountingSource {
    async fn download(&self, _url: &str, dest: &Path) -> SesameResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::copy(&self.archive, dest).map_err(|e| SesameError::io("copying archive", e))
    }
}

/// Source for tests whose cache is already populated
struct OfflineSource;

#[async_trait]
impl PackageSource for OfflineSource {
    async fn download(&self, url: &str, _dest: &Path) -> SesameResult<u64> {
        Err(SesameError::Download {
            url: url.to_string(),
            reason: "offline".to_string(),
        })
    }
}

fn configuration(project: &Project, dialect: ResponseFileDialect) -> BuildConfiguration {
    BuildConfiguration {
        toolchain: ToolchainSource::Package,
        package_id: PACKAGE_ID.to_string(),
        url_template: "https://packages.invalid/{id}.nupkg".to_string(),
        cache_dir: PathBuf::from("Library/InstalledPackages"),
        project_root: project.root().to_path_buf(),
        scratch_dir: PathBuf::from("Temp/sesame"),
        dialect,
        response_file: ResponseFileLookup::default(),
        allow_insecure_tls: false,
    }
}

fn orchestrator(project: &Project, dialect: ResponseFileDialect) -> BuildOrchestrator {
    BuildOrchestrator::with_source(
        configuration(project, dialect),
        Arc::new(ConfiguredHost::new(Some(PathBuf::from("/bin/sh")), None, None)),
        Arc::new(OfflineSource),
    )
}

#[tokio::test]
async fn build_writes_requested_artifacts() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");

    let report = orchestrator(&project, ResponseFileDialect::toolset())
        .build(
            "Coffee.Foo",
            Path::new("Assets/Plugins/Foo.dll"),
            CompileOptions::XML_DOC | CompileOptions::REF_DLL,
        )
        .await
        .unwrap();

    let out = project.path("Assets/Plugins");
    assert_eq!(fs::read_to_string(out.join("Foo.dll")).unwrap(), "assembly");
    assert!(out.join("Foo.pdb").exists());
    assert_eq!(fs::read_to_string(out.join("Foo.xml")).unwrap(), "<doc/>");
    assert_eq!(fs::read_to_string(out.join("Foo.ref.dll")).unwrap(), "reference");
    assert_eq!(report.copied.len(), 4);
    assert!(report.unchanged.is_empty());
}

#[tokio::test]
async fn release_build_has_no_symbols() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");

    let report = orchestrator(&project, ResponseFileDialect::toolset())
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::RELEASE)
        .await
        .unwrap();

    assert!(project.path("Out/Foo.dll").exists());
    assert!(!project.path("Out/Foo.pdb").exists());
    assert!(!project.path("Out/Foo.xml").exists());
    assert!(!project.path("Out/Foo.ref.dll").exists());
    assert_eq!(report.copied, vec![project.path("Out/Foo.dll")]);
}

#[tokio::test]
async fn staging_copies_only_what_was_produced() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");

    let report = orchestrator(&project, ResponseFileDialect::toolset())
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::NONE)
        .await
        .unwrap();

    assert_eq!(
        report.copied,
        vec![project.path("Out/Foo.dll"), project.path("Out/Foo.pdb")]
    );
}

#[tokio::test]
async fn rebuild_leaves_identical_output_alone() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");
    let orchestrator = orchestrator(&project, ResponseFileDialect::toolset());

    orchestrator
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::NONE)
        .await
        .unwrap();
    let report = orchestrator
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::NONE)
        .await
        .unwrap();

    assert!(report.copied.is_empty());
    assert_eq!(report.unchanged.len(), 2);
}

#[tokio::test]
async fn release_rebuild_removes_previous_symbols_and_docs() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");
    let orchestrator = orchestrator(&project, ResponseFileDialect::toolset());

    orchestrator
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::XML_DOC)
        .await
        .unwrap();
    assert!(project.path("Out/Foo.pdb").exists());
    assert!(project.path("Out/Foo.xml").exists());

    let report = orchestrator
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::RELEASE)
        .await
        .unwrap();

    assert!(project.path("Out/Foo.dll").exists());
    assert!(!project.path("Out/Foo.pdb").exists());
    assert!(!project.path("Out/Foo.xml").exists());
    assert_eq!(
        report.removed,
        vec![project.path("Out/Foo.pdb"), project.path("Out/Foo.xml")]
    );
}

#[tokio::test]
async fn direct_release_rebuild_reports_only_new_files() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");
    let dialect = ResponseFileDialect::toolset().with_output(OutputMode::Direct);
    let orchestrator = orchestrator(&project, dialect);

    orchestrator
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::REF_DLL)
        .await
        .unwrap();
    assert!(project.path("Out/Foo.ref.dll").exists());

    let report = orchestrator
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::RELEASE)
        .await
        .unwrap();

    assert_eq!(report.copied, vec![project.path("Out/Foo.dll")]);
    assert_eq!(
        report.removed,
        vec![project.path("Out/Foo.pdb"), project.path("Out/Foo.ref.dll")]
    );
    assert!(!project.path("Out/Foo.pdb").exists());
    assert!(!project.path("Out/Foo.ref.dll").exists());
}

#[tokio::test]
async fn failed_compile_keeps_previous_output() {
    let project = Project::new(FAILING_COMPILER);
    project.add_response_file("Coffee.Foo");
    project.write("Out/Foo.dll", "previous build");
    project.write("Out/Foo.pdb", "previous symbols");

    let err = orchestrator(&project, ResponseFileDialect::toolset())
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::NONE)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(BuildStage::Invoke));
    match err {
        SesameError::ProcessFailed { code, output, .. } => {
            assert_eq!(code, 1);
            assert!(output.contains("error CS1002"));
            assert!(output.contains("Compilation failed"));
        }
        other => panic!("expected ProcessFailed, got {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(project.path("Out/Foo.dll")).unwrap(),
        "previous build"
    );
    assert_eq!(
        fs::read_to_string(project.path("Out/Foo.pdb")).unwrap(),
        "previous symbols"
    );
}

#[tokio::test]
async fn legacy_dialect_optimizes_release() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");

    orchestrator(&project, ResponseFileDialect::legacy())
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::RELEASE)
        .await
        .unwrap();

    let rsp = fs::read_to_string(project.path("Temp/sesame/responses/mod_Coffee.Foo.rsp")).unwrap();
    assert!(rsp.contains("-optimize\n"));
    assert!(!rsp.contains("debug"));
    assert!(!rsp.contains("additionalfile"));
    assert!(!project.path("Out/Foo.pdb").exists());
}

#[tokio::test]
async fn direct_output_skips_staging() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");

    let dialect = ResponseFileDialect::toolset().with_output(OutputMode::Direct);
    let report = orchestrator(&project, dialect)
        .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::NONE)
        .await
        .unwrap();

    assert!(project.path("Out/Foo.dll").exists());
    assert!(!project.path("Temp/sesame/staging").exists());
    assert_eq!(report.copied.len(), 2);
}

#[tokio::test]
async fn missing_runtime_spawns_nothing() {
    let project = Project::new(FAKE_COMPILER);
    project.add_response_file("Coffee.Foo");

    let err = BuildOrchestrator::with_source(
        configuration(&project, ResponseFileDialect::toolset()),
        Arc::new(ConfiguredHost::default().without_path_search()),
        Arc::new(OfflineSource),
    )
    .build("Coffee.Foo", Path::new("Out/Foo.dll"), CompileOptions::NONE)
    .await
    .unwrap_err();

    assert!(matches!(err, SesameError::RuntimeNotFound { .. }));
    assert!(!project.path("Temp/sesame/responses").exists());
    assert!(!project.path("Out").exists());
}

#[tokio::test]
async fn builtin_compiler_builds_resource_directory() {
    let project = Project::new(FAKE_COMPILER);
    let contents = project.add_host_contents(RESOURCE_COMPILER);
    project.write("Packages/res/R~/rsp", "-target:library\nR.cs\n");

    let mut config = configuration(&project, ResponseFileDialect::toolset());
    config.toolchain = ToolchainSource::Builtin;
    let host = ConfiguredHost::new(Some(PathBuf::from("/bin/sh")), None, None)
        .without_path_search()
        .with_contents_dir(Some(contents));
    let orchestrator = BuildOrchestrator::with_source(config, Arc::new(host), Arc::new(OfflineSource));

    let report = orchestrator
        .build_resources(&ResourceBuild::new("Packages/res/R~"), Path::new("Out/R.dll"))
        .await
        .unwrap();

    assert_eq!(report.copied, vec![project.path("Out/R.dll")]);
    let built = fs::read_to_string(project.path("Out/R.dll")).unwrap();
    assert!(built.contains("R.cs"));
    assert!(built.contains("Managed/UnityEngine/UnityEngine.CoreModule.dll"));
    assert!(built.contains("NetStandard/ref/2.1.0/netstandard.dll"));
    assert!(built.contains("NetStandard/compat/shims/mscorlib.dll"));
}

#[tokio::test]
async fn resource_build_without_response_file() {
    let project = Project::new(FAKE_COMPILER);
    let contents = project.add_host_contents(RESOURCE_COMPILER);

    let mut config = configuration(&project, ResponseFileDialect::toolset());
    config.toolchain = ToolchainSource::Builtin;
    let host = ConfiguredHost::new(Some(PathBuf::from("/bin/sh")), None, None)
        .with_contents_dir(Some(contents));
    let err = BuildOrchestrator::with_source(config, Arc::new(host), Arc::new(OfflineSource))
        .build_resources(&ResourceBuild::new("Packages/res/R~"), Path::new("Out/R.dll"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(BuildStage::LocateResponseFile));
    assert!(!project.path("Out").exists());
}

#[tokio::test]
async fn cold_cache_downloads_once() {
    let work = TempDir::new().unwrap();
    let tree = work.path().join("tree");
    fs::create_dir_all(tree.join("tasks/netcore/bincore")).unwrap();
    fs::write(tree.join("tasks/netcore/bincore/csc.dll"), FAKE_COMPILER).unwrap();
    let archive = work.path().join("package.tar.gz");
    let status = Command::new("tar")
        .arg("-czf")
        .arg(&archive)
        .arg("-C")
        .arg(&tree)
        .arg(".")
        .status()
        .unwrap();
    assert!(status.success());

    let source = Arc::new(CountingSource {
        archive,
        calls: AtomicUsize::new(0),
    });
    let fetcher = PackageFetcher::new(
        work.path().join("cache"),
        work.path().join("downloads"),
        "https://packages.invalid/{id}.tar.gz",
        source.clone(),
    );

    let first = fetcher.resolve(PACKAGE_ID).await.unwrap();
    let second = fetcher.resolve(PACKAGE_ID).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(first.join("tasks/netcore/bincore/csc.dll").is_file());
    assert!(work
        .path()
        .join("downloads/opensesame.net.compilers.toolset.4.0.1.tar.gz")
        .is_file());
}
