//! gramscrape command-line entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use gramscrape::{PacingConfig, ScrapeError, Scraper, ScraperConfig};

#[derive(Parser)]
#[command(
    name = "gramscrape",
    about = "Fetch recent posts from a public Instagram profile",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent posts and print them as JSON.
    Fetch {
        /// Profile username, with or without a leading '@'.
        username: String,

        /// Maximum number of posts to return.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// JSON config file. Defaults to GRAMSCRAPE_* environment variables.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip the randomized delays between requests.
        #[arg(long)]
        no_pacing: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch {
            username,
            limit,
            config,
            no_pacing,
        } => {
            let mut config = match config {
                Some(path) => ScraperConfig::from_file(&path)?,
                None => ScraperConfig::from_env()?,
            };
            if no_pacing {
                config = config.with_pacing(PacingConfig::disabled());
            }

            let mut scraper = Scraper::new(config);
            match scraper.get_posts(&username, limit).await {
                Ok(posts) => println!("{}", serde_json::to_string_pretty(&posts)?),
                Err(ScrapeError::Exhausted) => {
                    for attempt in scraper.last_report() {
                        if let Some(failure) = &attempt.failure {
                            tracing::debug!(strategy = attempt.strategy, "{failure}");
                        }
                    }
                    eprintln!("Scraping failed");
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "gramscrape", &mut std::io::stdout());
        }
    }

    Ok(())
}
