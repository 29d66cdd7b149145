//! Toolchain command - show what a build would run

use super::{current_dir, orchestrator};
use crate::config::Config;
use crate::error::{SesameError, SesameResult};
use crate::platform::Platform;
use crate::toolchain::ToolchainSource;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the toolchain command
pub async fn execute(config: &Config) -> SesameResult<()> {
    let ctx = UiContext::detect();
    let build = config.build_configuration(&current_dir()?);

    println!("{}", style("Sesame Toolchain").bold().cyan());
    println!();
    ui::key_value(&ctx, "Platform", Platform::detect().name());
    match build.toolchain {
        ToolchainSource::Package => ui::key_value(&ctx, "Package", &build.package_id),
        ToolchainSource::Builtin => ui::key_value(&ctx, "Source", "host bundled compiler"),
    }
    ui::key_value(&ctx, "Project", &build.project_root.display().to_string());
    ui::key_value(&ctx, "Dialect", &format!("{:?}", config.build.dialect));

    let orchestrator = orchestrator(build, config);
    ui::key_value(&ctx, "Response files", &orchestrator.locator().describe());

    let info = orchestrator.toolchain_info().await?;
    if info.is_valid() {
        ui::key_value_status(&ctx, "Compiler", &info.compiler.display().to_string(), true);
    } else {
        ui::key_value_status(&ctx, "Compiler", "no csc.dll or csc.exe in package", false);
    }
    ui::key_value(&ctx, "Runtime kind", &info.kind.to_string());

    match info.with_runtime(orchestrator.host()) {
        Ok(resolved) => {
            ui::key_value_status(&ctx, "Runtime", &resolved.runtime.display().to_string(), true);
            Ok(())
        }
        Err(e @ SesameError::RuntimeNotFound { .. }) => {
            ui::key_value_status(&ctx, "Runtime", "not found", false);
            Err(e)
        }
        Err(e) => Err(e),
    }
}
