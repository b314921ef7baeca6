use anyhow::Result;
use clap::{Parser, Subcommand};
use ratehub::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ratehub::AppCommand {
    fn from(cmd: Commands) -> ratehub::AppCommand {
        match cmd {
            Commands::Serve { port } => ratehub::AppCommand::Serve { port },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve exchange rates over HTTP (default)
    Serve {
        /// Port to listen on, overriding config and environment
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine; variables may come from the real environment.
    let dotenv = dotenvy::dotenv();
    init_logging(cli.verbose);
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let result = match cli.command {
        Some(Commands::Setup) => ratehub::cli::setup::setup(),
        Some(cmd) => ratehub::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            ratehub::run_command(
                ratehub::AppCommand::Serve { port: None },
                cli.config_path.as_deref(),
            )
            .await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
