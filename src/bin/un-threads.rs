//! CLI binary for un-threads.
//!
//! A thin shim over the library crate: maps flags to `PipelineConfig`,
//! fetches the two feeds, runs the harvester and prints what happened.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use un_threads::{
    extract_reports, extract_resolutions, FeedKind, Harvester, LibraryClient, Ledger, NoPreview,
    OutboxPublisher, PdfiumRenderer, PipelineConfig, Platform, Publisher, RenderConfig, Renderer,
    RunReport, Status,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Post the next report and resolution on both platforms
  un-threads --ledger posted.json --outbox outbox/

  # Show the threads that would be posted, without posting
  un-threads --dry-run

  # Work from saved feeds instead of the live library
  un-threads --reports-xml reports.xml --resolutions-xml votes.xml --dry-run --json

  # Only X, three preview pages
  un-threads --platform x --pages 1,2,3

ENVIRONMENT VARIABLES:
  UN_THREADS_LEDGER       Ledger file (default posted.json)
  UN_THREADS_OUTBOX       Outbox directory (default outbox)
  PDFIUM_LIB_PATH         Path to libpdfium or its directory
  RUST_LOG                Override the log filter

EXIT STATUS:
  0  every platform posted, had nothing new, or was rate limited
  1  at least one step failed
"#;

/// Republish new UN reports and resolutions as threads.
#[derive(Parser, Debug)]
#[command(
    name = "un-threads",
    version,
    about = "Republish new UN reports and resolutions as social-media threads",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// JSON file recording what has been posted.
    #[arg(long, env = "UN_THREADS_LEDGER", default_value = "posted.json")]
    ledger: PathBuf,

    /// Directory receiving composed posts, one sub-directory per platform.
    #[arg(long, env = "UN_THREADS_OUTBOX", default_value = "outbox")]
    outbox: PathBuf,

    /// Platforms to post on (repeatable). Default: all.
    #[arg(long = "platform", value_enum, env = "UN_THREADS_PLATFORMS", value_delimiter = ',')]
    platforms: Vec<PlatformArg>,

    /// Records requested per feed.
    #[arg(long, env = "UN_THREADS_FEED_SIZE", default_value_t = 20)]
    feed_size: usize,

    /// Post length ceiling in characters.
    #[arg(long, env = "UN_THREADS_MAX_LENGTH", default_value_t = 300)]
    max_length: usize,

    /// Preview pages, 1-indexed: 1,2 or 1-3.
    #[arg(long, env = "UN_THREADS_PAGES", default_value = "1,2")]
    pages: String,

    /// Skip preview rendering entirely.
    #[arg(long, env = "UN_THREADS_NO_IMAGES")]
    no_images: bool,

    /// Digital library base URL.
    #[arg(long, env = "UN_THREADS_LIBRARY_URL", default_value = "https://digitallibrary.un.org")]
    library_url: String,

    /// HTTP timeout in seconds.
    #[arg(long, env = "UN_THREADS_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Read the report feed from this MARCXML file instead of the library.
    #[arg(long)]
    reports_xml: Option<PathBuf>,

    /// Read the voting-data feed from this MARCXML file instead of the library.
    #[arg(long)]
    resolutions_xml: Option<PathBuf>,

    /// Compose threads without publishing or updating the ledger.
    #[arg(long, env = "UN_THREADS_DRY_RUN")]
    dry_run: bool,

    /// Print the run report as JSON.
    #[arg(long, env = "UN_THREADS_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "UN_THREADS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "UN_THREADS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PlatformArg {
    Bluesky,
    X,
}

impl From<PlatformArg> for Platform {
    fn from(v: PlatformArg) -> Self {
        match v {
            PlatformArg::Bluesky => Platform::Bluesky,
            PlatformArg::X => Platform::X,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let client = LibraryClient::new(config.clone()).context("Failed to build HTTP client")?;

    // ── Feeds ────────────────────────────────────────────────────────────
    let reports_xml = read_feed(&client, FeedKind::Reports, cli.reports_xml.as_ref())?;
    let resolutions_xml = read_feed(&client, FeedKind::Resolutions, cli.resolutions_xml.as_ref())?;
    let reports = extract_reports(&reports_xml, &config).context("Report feed is unreadable")?;
    let resolutions =
        extract_resolutions(&resolutions_xml).context("Voting-data feed is unreadable")?;

    // ── Renderer ─────────────────────────────────────────────────────────
    let renderer: Box<dyn Renderer> = if cli.no_images {
        Box::new(NoPreview)
    } else {
        match PdfiumRenderer::bind(config.render.clone()) {
            Ok(r) => Box::new(r),
            Err(e) => {
                warn!("{}; posting without preview images", e);
                Box::new(NoPreview)
            }
        }
    };

    // ── Ledger and publishers ────────────────────────────────────────────
    let mut ledger = Ledger::load(&cli.ledger).context("Failed to load ledger")?;
    let platforms: Vec<Platform> = if cli.platforms.is_empty() {
        Platform::ALL.to_vec()
    } else {
        cli.platforms.iter().map(|&p| p.into()).collect()
    };

    let mut publishers: Vec<Box<dyn Publisher>> = Vec::with_capacity(platforms.len());
    for platform in platforms {
        let outbox = OutboxPublisher::new(&cli.outbox, platform)
            .with_context(|| format!("Failed to open outbox {:?}", cli.outbox))?
            .with_max_length(config.max_length);
        if ledger.ids(platform).is_empty() {
            let links = outbox.links().context("Failed to read outbox")?;
            ledger.reconcile(platform, links.iter().map(String::as_str));
        }
        publishers.push(Box::new(outbox));
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let harvester = Harvester::new(&config, &client, &client, renderer.as_ref()).dry_run(cli.dry_run);
    let report = harvester.run(&reports, &resolutions, &mut publishers, &mut ledger);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise run report")?
        );
    } else if !cli.quiet {
        print_report(&report);
    }

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{} of {} steps failed", failed, report.outcomes.len());
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let render = RenderConfig {
        pages: parse_pages(&cli.pages)?,
        ..RenderConfig::default()
    };
    PipelineConfig::builder()
        .max_length(cli.max_length)
        .feed_size(cli.feed_size)
        .library_url(cli.library_url.clone())
        .download_timeout_secs(cli.download_timeout)
        .render(render)
        .build()
        .context("Invalid configuration")
}

fn read_feed(client: &LibraryClient, kind: FeedKind, file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path)),
        None => client
            .fetch_feed(kind)
            .with_context(|| format!("Failed to fetch the {} feed", kind.collection())),
    }
}

/// Parse `--pages` ("1,2" or "1-3", 1-indexed) into zero-based indices.
fn parse_pages(s: &str) -> Result<Vec<usize>> {
    let s = s.trim();
    let pages: Vec<usize> = if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        (start..=end).collect()
    } else {
        s.split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?
    };
    if pages.contains(&0) {
        anyhow::bail!("Pages are 1-indexed, minimum is 1");
    }
    Ok(pages.into_iter().map(|p| p - 1).collect())
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        let label = format!("{:<8} {:<12}", outcome.platform, format!("{:?}", outcome.feed));
        match &outcome.status {
            Status::Posted { record_id, posts } => {
                eprintln!("{} {} posted {} ({} posts)", green("✔"), label, record_id, posts)
            }
            Status::Composed { record_id, units } => {
                eprintln!("{} {} would post {}", cyan("○"), label, record_id);
                for (i, unit) in units.iter().enumerate() {
                    println!("── {} / {} [{} chars] ──", i + 1, units.len(), unit.char_len());
                    println!("{}", unit.text);
                }
            }
            Status::NothingNew => eprintln!("{} {} {}", dim("·"), label, dim("nothing new")),
            Status::Tolerated { error } => eprintln!("{} {} {}", cyan("⚠"), label, error),
            Status::Failed { error } => eprintln!("{} {} {}", red("✘"), label, error),
        }
    }
}
