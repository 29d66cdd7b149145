//! Cache command - manage installed compiler packages

use super::{current_dir, orchestrator};
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::SesameResult;
use crate::package::PackageFetcher;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> SesameResult<()> {
    let build = config.build_configuration(&current_dir()?);
    let current = build.package_id.clone();
    let orchestrator = orchestrator(build, config);
    let fetcher = orchestrator.fetcher();

    match args.action {
        CacheAction::List => list_packages(fetcher, &current),
        CacheAction::Clear { package_id, yes } => clear_packages(fetcher, package_id, yes).await,
    }
}

fn list_packages(fetcher: &PackageFetcher, current: &str) -> SesameResult<()> {
    let packages = fetcher.installed()?;

    if packages.is_empty() {
        println!("No packages installed in {}", fetcher.cache_root().display());
        return Ok(());
    }

    println!("{:<50} {:<8}", "PACKAGE", "ACTIVE");
    println!("{}", "-".repeat(58));

    for package in &packages {
        let active = if package.id == current {
            style("yes").green().to_string()
        } else {
            style("no").dim().to_string()
        };
        println!("{:<50} {:<8}", package.id, active);
    }

    println!();
    println!("Total: {} package(s) in {}", packages.len(), fetcher.cache_root().display());
    Ok(())
}

async fn clear_packages(
    fetcher: &PackageFetcher,
    package_id: Option<String>,
    yes: bool,
) -> SesameResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);

    let targets: Vec<String> = match package_id {
        Some(id) => vec![id],
        None => fetcher.installed()?.into_iter().map(|p| p.id).collect(),
    };

    if targets.is_empty() {
        ui::step_info(&ctx, "Nothing to clear");
        return Ok(());
    }

    let prompt = format!("Delete {} package(s) from the cache?", targets.len());
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Cache left untouched", "Pass --yes to skip the prompt");
        return Ok(());
    }

    for id in &targets {
        if fetcher.remove(id)? {
            ui::step_ok(&ctx, &format!("Removed {}", id));
        } else {
            ui::step_warn(&ctx, &format!("{} is not installed", id));
        }
    }

    Ok(())
}
