//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress over a fixed number of assembly builds.
///
/// An indicatif bar in interactive mode, one line per assembly otherwise.
pub struct BuildProgress {
    bar: Option<ProgressBar>,
}

impl BuildProgress {
    pub fn new(ctx: &UiContext, total: u64) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total);
            let template = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"));
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            None
        };
        Self { bar }
    }

    /// An assembly build started
    pub fn start(&self, module: &str) {
        match self.bar {
            Some(ref bar) => bar.set_message(module.to_string()),
            None => println!("Building {}...", module),
        }
    }

    /// An assembly build finished with `written` artifacts copied
    pub fn done(&self, module: &str, written: usize) {
        match self.bar {
            Some(ref bar) => {
                bar.println(format!("  {} {}", style("✓").green(), module));
                bar.inc(1);
            }
            None => println!(
                "  {} {} ({} file(s) written)",
                style("[OK]").green(),
                module,
                written
            ),
        }
    }

    /// An assembly build failed and the batch continues
    pub fn failed(&self, reason: &str) {
        match self.bar {
            Some(ref bar) => {
                bar.println(format!("  {} {}", style("✗").red(), reason));
                bar.inc(1);
            }
            None => println!("  {} {}", style("[FAIL]").red(), reason),
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Building Coffee.Foo...");
        spinner.stop("Built Coffee.Foo");
        spinner.stop_error("never started");
    }

    #[test]
    fn build_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = BuildProgress::new(&ctx, 2);
        progress.start("Coffee.Foo");
        progress.done("Coffee.Foo", 2);
        progress.start("Coffee.Bar");
        progress.failed("compiler exited with code 1");
        progress.finish();
    }
}
