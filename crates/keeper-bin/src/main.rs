//! Session Keeper - keeps a Supabase session fresh for as long as it runs.

mod app;
mod signals;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keeper_config_and_utils::{init_logging, Config, Paths};

/// Session Keeper command-line interface.
#[derive(Parser, Debug)]
#[command(name = "session-keeper")]
#[command(about = "Signs in to Supabase and refreshes the session before it expires")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to ~/.session-keeper
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and keep the session refreshed until interrupted
    Run {
        /// Account email
        #[arg(long, env = "SESSION_KEEPER_EMAIL")]
        email: String,

        /// Account password
        #[arg(long, env = "SESSION_KEEPER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    match cli.command {
        Commands::Run { email, password } => {
            paths.ensure_dirs()?;
            init_logging(&config.log_level, Some(paths.log_file()))?;
            app::run_keeper(config, &email, &password).await?;
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
