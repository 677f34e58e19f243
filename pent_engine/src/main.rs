use anyhow::{Context, Result};
use pent_engine::cli::{self, Command};
use pent_engine::config::EngineConfig;
use pent_engine::runtime;

fn main() -> Result<()> {
    let cli = cli::parse()?;
    init_logging(cli.verbose);

    let config = EngineConfig::from_json_file(cli.config.as_deref())
        .context("loading engine config")?;
    match cli.command {
        Command::Demo(args) => runtime::execute_demo(config, args),
        Command::Inspect(args) => runtime::execute_inspect(config, args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}
