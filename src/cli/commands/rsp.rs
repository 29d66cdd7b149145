//! Rsp command - rewrite a response file without compiling

use super::current_dir;
use crate::cli::args::RspArgs;
use crate::config::Config;
use crate::error::{SesameError, SesameResult};
use crate::response;

/// Execute the rsp command
pub async fn execute(args: RspArgs, config: &Config) -> SesameResult<()> {
    let mut config = config.clone();
    if let Some(dialect) = args.options.dialect {
        config.build.dialect = dialect;
    }
    let dialect = config.dialect();
    let options = args.options.options();
    let output = current_dir()?.join(&args.out);

    if args.print {
        let input = std::fs::read_to_string(&args.src).map_err(|e| {
            SesameError::io(format!("reading response file {}", args.src.display()), e)
        })?;
        print!("{}", response::transform_text(&input, &output, options, &dialect));
        return Ok(());
    }

    let dst = response::transform(&args.src, &output, options, &dialect)?;
    println!("{}", dst.display());
    Ok(())
}
