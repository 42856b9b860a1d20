//! siteclone main entry point
//!
//! This is the command-line interface for the siteclone offline website mirror.

use anyhow::{bail, Context};
use clap::Parser;
use siteclone::config::{load_config_with_hash, MirrorConfig};
use siteclone::crawler::Coordinator;
use siteclone::output::{
    print_summary, NoopReporter, ProgressReporter, SpinnerLogWriter, SpinnerReporter, TracingReporter,
};
use siteclone::server::serve;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// siteclone: mirror a website for offline browsing
///
/// siteclone crawls a site breadth-first from URL, downloads the assets its
/// pages reference, rewrites every link to point at the local copy and writes a
/// service worker that precaches the whole tree.
#[derive(Parser, Debug)]
#[command(name = "siteclone")]
#[command(version)]
#[command(about = "Mirror a website for offline browsing", long_about = None)]
#[command(after_help = "Example:\n  siteclone https://example.com --out dist/example --max-pages 50 --serve 4173 --open")]
struct Cli {
    /// Website URL to clone (overrides start-url from --config)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Output directory [default: dist/site]
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Max number of pages to crawl [default: 100]
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Only download same-origin assets [default: true]
    #[arg(long, value_name = "BOOL")]
    same_origin: Option<bool>,

    /// Asset download concurrency [default: 10]
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// HTTP timeout in milliseconds [default: 20000]
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Respect robots.txt [default: true]
    #[arg(long, value_name = "BOOL")]
    respect_robots: Option<bool>,

    /// Start a local HTTP server on this port after cloning
    #[arg(long, value_name = "PORT")]
    serve: Option<u16>,

    /// Open the default browser once the server is up
    #[arg(long, requires = "serve")]
    open: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies the flags given on the command line on top of `config`
    fn apply(&self, config: &mut MirrorConfig) {
        if let Some(url) = &self.url {
            config.start_url = url.clone();
        }
        if let Some(out) = &self.out {
            config.output.out_dir = out.to_string_lossy().into_owned();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if let Some(same_origin) = self.same_origin {
            config.crawler.same_origin = same_origin;
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.crawler.timeout_ms = timeout;
        }
        if let Some(respect_robots) = self.respect_robots {
            config.crawler.respect_robots = respect_robots;
        }
    }

    /// The spinner is only drawn at the default verbosity
    fn shows_spinner(&self) -> bool {
        !self.quiet && self.verbose == 0
    }

    fn reporter(&self, spinner: Option<SpinnerReporter>) -> Box<dyn ProgressReporter> {
        match spinner {
            Some(spinner) => Box::new(spinner),
            None if self.quiet => Box::new(NoopReporter),
            None => Box::new(TracingReporter),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let spinner = cli.shows_spinner().then(SpinnerReporter::new);
    setup_logging(
        cli.verbose,
        cli.quiet,
        spinner.as_ref().map(SpinnerReporter::log_writer),
    );

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => MirrorConfig::default(),
    };
    cli.apply(&mut config);

    if config.start_url.is_empty() {
        bail!("no URL given: pass one as an argument or set start-url in --config");
    }

    let out_dir = PathBuf::from(&config.output.out_dir);
    let coordinator = Coordinator::new(config)?.with_reporter(cli.reporter(spinner));

    tokio::select! {
        result = coordinator.run() => {
            let summary = result.context("clone failed")?;
            if !cli.quiet {
                print_summary(&summary);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; files written so far remain in {}", out_dir.display());
            std::process::exit(130);
        }
    }

    if let Some(port) = cli.serve {
        serve(out_dir, port, cli.open).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With a spinner on screen, log lines go through its writer so they are printed
/// above it instead of being overdrawn.
fn setup_logging(verbose: u8, quiet: bool, spinner: Option<SpinnerLogWriter>) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("siteclone=info,warn"),
            1 => EnvFilter::new("siteclone=debug,info"),
            2 => EnvFilter::new("siteclone=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let writer = match spinner {
        Some(spinner) => BoxMakeWriter::new(move || spinner.clone()),
        None => BoxMakeWriter::new(std::io::stdout),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
