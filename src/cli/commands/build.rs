//! Build command - compile one assembly

use super::{current_dir, orchestrator};
use crate::build::{asmdef, BuildReport};
use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::{SesameError, SesameResult};
use crate::toolchain::ToolchainSource;
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::{Path, PathBuf};

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> SesameResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();
    if let Some(dialect) = args.options.dialect {
        config.build.dialect = dialect;
    }
    config.build.direct_output |= args.direct;
    if args.builtin {
        config.toolchain.source = ToolchainSource::Builtin;
    }

    let build = config.build_configuration(&current_dir()?);
    let (module, output) = target(&args.module, args.out.as_deref(), &build.project_root)?;
    let options = args.options.options();

    let orchestrator = orchestrator(build, &config);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Building {}...", module));

    match orchestrator.build(&module, &output, options).await {
        Ok(report) => {
            spinner.stop(&format!("Built {}", module));
            print_report(&ctx, &report);
            Ok(())
        }
        Err(e) => {
            spinner.stop_error(&format!("Build of {} failed", module));
            Err(e)
        }
    }
}

/// Module name and output path; a `.asmdef` argument supplies both
fn target(module: &str, out: Option<&Path>, root: &Path) -> SesameResult<(String, PathBuf)> {
    if module.ends_with(".asmdef") {
        let path = root.join(module);
        let name = asmdef::assembly_name(&path)?;
        let output = match out {
            Some(out) => root.join(out),
            None => asmdef::default_output_path(&path, &name),
        };
        return Ok((name, output));
    }

    match out {
        Some(out) => Ok((module.to_string(), root.join(out))),
        None => Err(SesameError::User(format!(
            "No output path for '{}'. Pass --out or an .asmdef file",
            module
        ))),
    }
}

pub(crate) fn print_report(ctx: &UiContext, report: &BuildReport) {
    for path in &report.copied {
        ui::step_ok_detail(ctx, "Written", &path.display().to_string());
    }
    for path in &report.unchanged {
        ui::remark(ctx, &format!("Unchanged: {}", path.display()));
    }
    for path in &report.removed {
        ui::remark(ctx, &format!("Removed: {}", path.display()));
    }
}
