mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arbiter-cli")]
#[command(about = "Arbiter CLI - Grade submissions against test cases via the execution sandbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a source file against a JSON test-case file
    Grade {
        /// Path to the submission source file
        #[arg(short, long)]
        source: PathBuf,

        /// Submission language (python, javascript)
        #[arg(short, long)]
        language: String,

        /// Path to the test-case file: a JSON array of {"input", "expected"}
        #[arg(short, long)]
        tests: PathBuf,

        /// Sandbox execute endpoint (defaults to ARBITER_SANDBOX_URL or the public endpoint)
        #[arg(long)]
        sandbox_url: Option<String>,

        /// Per-call timeout in seconds
        #[arg(long, default_value = "20")]
        timeout_secs: u64,

        /// Path to a runtimes.json registry file (defaults to built-in runtimes)
        #[arg(long)]
        runtimes: Option<PathBuf>,
    },

    /// List configured language runtimes
    Languages {
        /// Path to a runtimes.json registry file (defaults to built-in runtimes)
        #[arg(long)]
        runtimes: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            source,
            language,
            tests,
            sandbox_url,
            timeout_secs,
            runtimes,
        } => {
            commands::grade(
                &source,
                &language,
                &tests,
                sandbox_url.as_deref(),
                timeout_secs,
                runtimes.as_deref(),
            )
            .await?;
        }
        Commands::Languages { runtimes } => {
            commands::list_languages(runtimes.as_deref())?;
        }
    }

    Ok(())
}
