//! Build-all command - compile every configured assembly

use super::{current_dir, orchestrator};
use crate::cli::args::BuildAllArgs;
use crate::config::Config;
use crate::error::{SesameError, SesameResult};
use crate::ui::{self, BuildProgress, UiContext};
use tracing::warn;

/// Execute the build-all command
pub async fn execute(args: BuildAllArgs, config: &Config) -> SesameResult<()> {
    let ctx = UiContext::detect();

    if config.assemblies.is_empty() {
        ui::step_warn_hint(
            &ctx,
            "No assemblies configured",
            "Add [[assemblies]] entries to .sesame.toml",
        );
        return Ok(());
    }

    let build = config.build_configuration(&current_dir()?);
    let root = build.project_root.clone();
    let orchestrator = orchestrator(build, config);

    let progress = BuildProgress::new(&ctx, config.assemblies.len() as u64);
    let mut failed = Vec::new();

    for entry in &config.assemblies {
        let result = match entry.resolve(&root) {
            Ok((module, output)) => {
                progress.start(&module);
                orchestrator
                    .build(&module, &output, entry.options)
                    .await
                    .map(|report| (module, report))
            }
            Err(e) => Err(e),
        };

        match result {
            Ok((module, report)) => progress.done(&module, report.copied.len()),
            Err(e) if args.keep_going => {
                warn!("Assembly build failed: {}", e);
                progress.failed(&e.to_string());
                failed.push(e.to_string());
            }
            Err(e) => {
                progress.finish();
                return Err(e);
            }
        }
    }

    progress.finish();

    if failed.is_empty() {
        ui::outro_success(
            &ctx,
            &format!("Built {} assemblies", config.assemblies.len()),
        );
        Ok(())
    } else {
        Err(SesameError::User(format!(
            "{} of {} assemblies failed",
            failed.len(),
            config.assemblies.len()
        )))
    }
}
