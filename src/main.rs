use clap::Parser;
use databnf_sparql::{CliArgs, ClientConfig, LoggingConfig, init_logging, run_command};
use std::io;

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = ClientConfig::from_args(&cli)?;

    // Fail fast before touching the network or the cache directory
    config.validate()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(config, cli.command, &mut out)
}
