//! CLI argument definitions using clap derive

use crate::build::CompileOptions;
use crate::response::DialectPreset;
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Sesame - out-of-band C# assembly builder
///
/// Recompiles a host project's assemblies with a newer compiler package,
/// reusing the response files the host already generated.
#[derive(Parser, Debug)]
#[command(name = "sesame")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SESAME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .sesame.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build one assembly
    Build(BuildArgs),

    /// Build every assembly listed in the configuration
    BuildAll(BuildAllArgs),

    /// Install a compiler package into the cache
    Install(InstallArgs),

    /// Show the compiler and runtime a build would use
    Toolchain,

    /// Compile a resource directory with its own response file
    Resource(ResourceArgs),

    /// Rewrite a response file without compiling
    Rsp(RspArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Manage installed compiler packages
    Cache(CacheArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Compile option switches shared by `build` and `rsp`
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// Release build
    #[arg(long)]
    pub release: bool,

    /// Emit XML documentation next to the dll
    #[arg(long)]
    pub xml_doc: bool,

    /// Emit a reference assembly (.ref.dll)
    #[arg(long)]
    pub ref_dll: bool,

    /// Keep analyzer references
    #[arg(long)]
    pub analyzer: bool,

    /// Response file dialect (defaults to configuration)
    #[arg(long, value_enum)]
    pub dialect: Option<DialectPreset>,
}

impl OptionArgs {
    pub fn options(&self) -> CompileOptions {
        CompileOptions::from_switches(self.release, self.xml_doc, self.ref_dll, self.analyzer)
    }
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Module name, or path to an .asmdef file
    pub module: String,

    /// Output dll (derived from the .asmdef when omitted)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub options: OptionArgs,

    /// Compile straight to the output instead of staging
    #[arg(long)]
    pub direct: bool,

    /// Use the host's bundled compiler instead of the compiler package
    #[arg(long)]
    pub builtin: bool,
}

/// Arguments for the resource command
#[derive(Parser, Debug)]
pub struct ResourceArgs {
    /// Resource directory (defaults to [resource] dir)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output dll (defaults to [resource] output)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Use the host's bundled compiler instead of the compiler package
    #[arg(long)]
    pub builtin: bool,

    /// Compile straight to the output instead of staging
    #[arg(long)]
    pub direct: bool,
}

/// Arguments for the build-all command
#[derive(Parser, Debug)]
pub struct BuildAllArgs {
    /// Keep going after a failed assembly
    #[arg(short, long)]
    pub keep_going: bool,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Package id (defaults to the configured toolchain package)
    pub package_id: Option<String>,
}

/// Arguments for the rsp command
#[derive(Parser, Debug)]
pub struct RspArgs {
    /// Source response file
    pub src: PathBuf,

    /// Output dll the rewritten file should point at
    #[arg(short, long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub options: OptionArgs,

    /// Print the rewritten contents instead of writing mod_<name>
    #[arg(long)]
    pub print: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,

        /// Write a project-local .sesame.toml instead
        #[arg(long)]
        local: bool,
    },
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List installed packages
    List,

    /// Delete installed packages
    Clear {
        /// Only delete this package
        package_id: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
