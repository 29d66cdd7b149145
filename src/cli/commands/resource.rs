//! Resource command - compile a resource directory

use super::build::print_report;
use super::{current_dir, orchestrator};
use crate::cli::args::ResourceArgs;
use crate::config::Config;
use crate::error::{SesameError, SesameResult};
use crate::toolchain::ToolchainSource;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the resource command
pub async fn execute(args: ResourceArgs, config: &Config) -> SesameResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();
    config.build.direct_output |= args.direct;
    if args.builtin {
        config.toolchain.source = ToolchainSource::Builtin;
    }

    let resources = config.resource.build(args.dir.as_deref())?;
    let output = args
        .out
        .or_else(|| config.resource.output.clone())
        .ok_or_else(|| {
            SesameError::User("No output path. Pass --out or set [resource] output".to_string())
        })?;

    let build = config.build_configuration(&current_dir()?);
    let orchestrator = orchestrator(build, &config);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Building {}...", resources.dir.display()));

    match orchestrator.build_resources(&resources, &output).await {
        Ok(report) => {
            spinner.stop(&format!("Built {}", output.display()));
            print_report(&ctx, &report);
            ui::remark(&ctx, &format!("Resources: {}", resources.response_path().display()));
            Ok(())
        }
        Err(e) => {
            spinner.stop_error(&format!("Build of {} failed", resources.dir.display()));
            Err(e)
        }
    }
}
