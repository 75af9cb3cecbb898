//! Logging configuration for the sonar node.

use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::args::LogArgs;

/// Initialize logging based on command line arguments.
///
/// The filter is built with the following precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` env var if set, or a level derived from verbosity
/// 3. Apply any custom filter from `--log.filter`
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let filter = build_filter(args, EnvFilter::try_from_default_env().ok());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if args.json {
        builder
            .json()
            .try_init()
            .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))?;
    } else {
        builder
            .try_init()
            .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))?;
    }

    Ok(())
}

/// Build the log filter. `env` is the filter from `RUST_LOG`, if any.
fn build_filter(args: &LogArgs, env: Option<EnvFilter>) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter = env.unwrap_or_else(|| EnvFilter::new(base_level));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',') {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("ignoring invalid log directive {directive:?}: {e}"),
            }
        }
    }

    filter
}
