use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    about = "Host for the gump scene graph and the process kernel",
    version
)]
pub struct Cli {
    /// Optional JSON engine config (defaults apply to missing fields)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scripted demo session: a faded book, a container, a drag
    Demo(DemoArgs),
    /// Load a savegame into a fresh session and describe it
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Number of frames to run
    #[arg(long, default_value_t = 120)]
    pub ticks: u32,

    /// Path to write the final session as a savegame
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Path to write the final gump tree as JSON
    #[arg(long)]
    pub tree_json: Option<PathBuf>,

    /// Path to write the demo summary as JSON
    #[arg(long)]
    pub report_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Savegame written by `demo --save`
    pub save: PathBuf,

    /// Path to write the restored gump tree as JSON
    #[arg(long)]
    pub tree_json: Option<PathBuf>,
}

pub fn parse() -> Result<Cli> {
    let cli = Cli::parse();
    cli.validate()?;
    Ok(cli)
}

impl Cli {
    fn validate(&self) -> Result<()> {
        if let Command::Demo(args) = &self.command {
            if args.ticks == 0 {
                bail!("--ticks must be at least 1");
            }
        }
        Ok(())
    }
}
