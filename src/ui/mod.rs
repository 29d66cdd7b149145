//! Console output for the CLI
//!
//! Spinners, progress bars and status lines render through `cliclack` and
//! `indicatif` in a terminal and fall back to plain prefixed lines in CI or
//! when output is piped.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, outro_success, remark, step_info, step_ok, step_ok_detail,
    step_warn, step_warn_hint,
};
pub use progress::{BuildProgress, TaskSpinner};
pub use prompts::confirm;
