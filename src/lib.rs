//! Sesame - out-of-band C# assembly builder
//!
//! Rebuilds assemblies of a host project with a separately installed
//! compiler package. The host's own response files are reused: each is
//! rewritten to redirect output and apply build options, the compiler runs
//! against the rewritten copy, and the artifacts are promoted to their
//! destination only after a successful compile.
//!
//! The entry point is [`build::BuildOrchestrator`].

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod package;
pub mod platform;
pub mod process;
pub mod response;
pub mod toolchain;
pub mod ui;

pub use error::{SesameError, SesameResult};
