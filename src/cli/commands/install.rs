//! Install command - fetch a compiler package into the cache

use super::{current_dir, orchestrator};
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::SesameResult;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> SesameResult<()> {
    let ctx = UiContext::detect();
    let build = config.build_configuration(&current_dir()?);
    let package_id = args.package_id.unwrap_or_else(|| build.package_id.clone());
    let orchestrator = orchestrator(build, config);

    let descriptor = orchestrator.fetcher().descriptor(&package_id)?;
    if descriptor.is_installed() {
        ui::step_ok_detail(
            &ctx,
            &format!("{} already installed", package_id),
            &descriptor.install_dir.display().to_string(),
        );
        return Ok(());
    }

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Installing {}...", package_id));

    match orchestrator.fetcher().resolve(&package_id).await {
        Ok(dir) => {
            spinner.stop(&format!("Installed {}", package_id));
            ui::key_value(&ctx, "Location", &dir.display().to_string());
            Ok(())
        }
        Err(e) => {
            spinner.stop_error(&format!("Could not install {}", package_id));
            Err(e)
        }
    }
}
