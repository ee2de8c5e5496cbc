use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::commands;

/// Stagehand - deploy, remove and run methods on platform instances
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version, disable_version_flag = true)]
#[command(about = "Stagehand - deploy, remove and run methods on platform instances")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show version
    #[arg(long, global = true)]
    pub version: bool,

    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags shared by every instance operation.
#[derive(Args, Debug, Clone, Default)]
pub struct RunFlags {
    /// Stream the instance's logs while the command runs
    #[arg(long)]
    pub debug: bool,

    /// Attach the dev agent (deploy only)
    #[arg(long)]
    pub dev: bool,

    /// Stage to target instead of the one in stagehand.toml
    #[arg(long, env = "STAGEHAND_STAGE")]
    pub stage: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command on the instance in the current directory
    Run {
        /// `deploy`, `remove` or any method the instance's component exposes
        #[arg(value_name = "COMMAND")]
        command: String,

        #[command(flatten)]
        flags: RunFlags,
    },

    /// Deploy the instance (same as `run deploy`)
    Deploy {
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Remove the instance (same as `run remove`)
    #[command(visible_aliases = ["rm"])]
    Remove {
        #[command(flatten)]
        flags: RunFlags,
    },
}

impl Cli {
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        if self.version {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let Some(command) = self.command else {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        };

        let (name, flags) = match command {
            Commands::Run { command, flags } => (command, flags),
            Commands::Deploy { flags } => ("deploy".to_string(), flags),
            Commands::Remove { flags } => ("remove".to_string(), flags),
        };
        commands::run::run(&name, flags.debug, flags.dev, flags.stage.as_deref())
    }
}
