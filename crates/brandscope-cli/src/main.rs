mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "brandscope-cli")]
#[command(about = "Brand presence consistency analysis from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Estimate the prompt size for a platforms file without calling the model
    Estimate {
        /// JSON file holding `{"platforms": [...]}` or a bare array of entries
        file: PathBuf,
        /// Token budget to check against (defaults to `BRANDSCOPE_TOKEN_BUDGET`)
        #[arg(long)]
        budget: Option<usize>,
    },
    /// Run an analysis against a brandscope server and print the report
    Analyze {
        /// JSON file holding `{"platforms": [...]}` or a bare array of entries
        file: PathBuf,
        /// Server base URL (defaults to `BRANDSCOPE_SERVER_URL`)
        #[arg(long)]
        server: Option<String>,
        /// Write the report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Suppress the streaming preview on stderr
        #[arg(long)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = brandscope_core::load_client_config()?;

    match cli.command {
        Commands::Estimate { file, budget } => {
            let platforms = commands::load_platforms(&file)?;
            commands::run_estimate(&platforms, budget.unwrap_or(config.token_budget));
        }
        Commands::Analyze {
            file,
            server,
            out,
            quiet,
        } => {
            if let Some(server) = server {
                config.server_url = server.trim_end_matches('/').to_string();
            }
            let platforms = commands::load_platforms(&file)?;
            commands::run_analyze(&config, &platforms, out.as_deref(), quiet).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
