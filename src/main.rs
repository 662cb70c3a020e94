// Command-line front end for the press-release crawler.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use release_harvester::{CrawlConfig, CrawlStatus, Interrupt, NoOpProgress, open_chromium_engine};

#[derive(Debug, Parser)]
#[command(name = "release-harvester", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Crawl the listing from the saved cursor
    Crawl(RunArgs),
    /// Retry links recorded in the retry queue
    Replay(RunArgs),
    /// Print the saved crawl state
    Status(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// JSON config file; unset fields keep their defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory for saved articles (state goes to <DIR>/.state)
    #[arg(long)]
    storage_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Listing URL to paginate
    #[arg(long)]
    base_url: Option<String>,

    /// Articles rendered at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Stop after this many index pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Show the browser window (debug builds only)
    #[arg(long)]
    headed: bool,
}

impl ConfigArgs {
    fn load(&self) -> Result<CrawlConfig> {
        let config = match &self.config {
            Some(path) => CrawlConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => CrawlConfig::default(),
        };
        let mut builder = config.into_builder();
        if let Some(dir) = &self.storage_dir {
            builder = builder.storage_dir(dir);
        }
        Ok(builder.build()?)
    }
}

impl RunArgs {
    fn load(&self) -> Result<CrawlConfig> {
        let mut builder = self.config.load()?.into_builder();
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(workers) = self.concurrency {
            builder = builder.concurrency(workers);
        }
        if self.max_pages.is_some() {
            builder = builder.max_pages(self.max_pages);
        }
        if self.headed {
            builder = builder.headless(false);
        }
        Ok(builder.build()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Crawl(args) => {
            let config = args.load()?;
            let engine = open_chromium_engine(config, NoOpProgress).await?;

            let stop = engine.stop_handle();
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    match stop.interrupt() {
                        Interrupt::Drain => warn!(
                            "Interrupt received, stopping after the current page (Ctrl-C again to quit now)"
                        ),
                        Interrupt::ForceQuit => {
                            error!("Second interrupt, exiting without a final flush");
                            std::process::exit(130);
                        }
                    }
                }
            });

            let summary = engine.run().await?;
            info!(
                "Stopped: {} ({} pages, {} saved, {} rejected, {} failed)",
                summary.reason,
                summary.pages_completed,
                summary.articles.saved,
                summary.articles.rejected,
                summary.articles.failed
            );
        }
        Command::Replay(args) => {
            let config = args.load()?;
            let engine = open_chromium_engine(config, NoOpProgress).await?;
            let summary = engine.replay().await?;
            info!(
                "Replayed {} links: {} saved, {} rejected, {} failed, {} still queued",
                summary.attempted,
                summary.articles.saved,
                summary.articles.rejected,
                summary.articles.failed,
                summary.remaining
            );
        }
        Command::Status(args) => {
            let config = args.load()?;
            let status = CrawlStatus::load(&config).await?;
            println!("{status}");
        }
    }
    Ok(())
}
