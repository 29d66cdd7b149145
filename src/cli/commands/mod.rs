//! CLI command implementations

pub mod build;
pub mod build_all;
pub mod cache;
pub mod completions;
pub mod config;
pub mod install;
pub mod resource;
pub mod rsp;
pub mod toolchain;

pub use build::execute as build;
pub use build_all::execute as build_all;
pub use cache::execute as cache;
pub use completions::execute as completions;
pub use config::execute as config;
pub use install::execute as install;
pub use resource::execute as resource;
pub use rsp::execute as rsp;
pub use toolchain::execute as toolchain;

use crate::build::{BuildConfiguration, BuildOrchestrator};
use crate::config::Config;
use crate::error::{SesameError, SesameResult};
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) fn current_dir() -> SesameResult<PathBuf> {
    std::env::current_dir().map_err(|e| SesameError::io("getting current directory", e))
}

/// Orchestrator backed by the configured host runtimes
pub(crate) fn orchestrator(build: BuildConfiguration, config: &Config) -> BuildOrchestrator {
    let host = config.host.host(&build.project_root);
    BuildOrchestrator::new(build, Arc::new(host))
}
