use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use eventcrawl_core::{
    Browser, BrowserFetcher, CrawlConfig, CrawlError, CrawlReport, CrawlState, DEFAULT_TARGET_URL,
    Extractor, FetchConfig, FetchTarget, FileFetcher, HttpFetcher, OutputEncoding, PageFetcher,
    SinkReport, run_crawl,
};

/// CLI wrapper for Browser enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliBrowser {
    #[default]
    Chromium,
    Chrome,
    Edge,
}

impl From<CliBrowser> for Browser {
    fn from(cli: CliBrowser) -> Self {
        match cli {
            CliBrowser::Chromium => Browser::Chromium,
            CliBrowser::Chrome => Browser::Chrome,
            CliBrowser::Edge => Browser::Edge,
        }
    }
}

#[derive(Clone, Default, ValueEnum)]
enum CliFetcher {
    /// Headless browser, runs page scripts
    #[default]
    Browser,
    /// Plain HTTP request, no scripts
    Http,
}

#[derive(Clone, Default, ValueEnum)]
enum CliEncoding {
    #[default]
    Utf8,
    Utf8Bom,
}

impl From<CliEncoding> for OutputEncoding {
    fn from(cli: CliEncoding) -> Self {
        match cli {
            CliEncoding::Utf8 => OutputEncoding::Utf8,
            CliEncoding::Utf8Bom => OutputEncoding::Utf8Bom,
        }
    }
}

#[derive(Parser)]
#[command(name = "eventcrawl")]
#[command(about = "Crawl an event listing page and save the events as JSON and Markdown")]
struct Cli {
    /// Listing page URL
    #[arg(default_value = DEFAULT_TARGET_URL)]
    url: String,

    /// How to fetch the page
    #[arg(short, long, default_value = "browser")]
    fetcher: CliFetcher,

    /// Read page markup from a file instead of fetching
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Browser used by the browser fetcher
    #[arg(short, long, default_value = "chromium")]
    browser: CliBrowser,

    /// Browser executable. Defaults to $EVENTCRAWL_BROWSER, then a PATH search.
    #[arg(long, value_name = "PATH")]
    browser_path: Option<PathBuf>,

    /// Fetch timeout in seconds
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,

    /// Directory for eventbrite_events.json and eventbrite_events.md
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Encoding of both output files
    #[arg(short, long, default_value = "utf8")]
    encoding: CliEncoding,

    /// Also print the Markdown document
    #[arg(short, long)]
    print: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn state_message(state: CrawlState, url: &str) -> String {
    match state {
        CrawlState::Init => "Starting fetcher...".to_string(),
        CrawlState::Fetching => format!("Fetching {}...", url),
        CrawlState::Extracting => "Extracting events...".to_string(),
        CrawlState::Persisting => "Saving events...".to_string(),
        CrawlState::Done => "Done".to_string(),
        CrawlState::Failed => "Failed".to_string(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the pipeline with one fetcher. `Ok(None)` means the fetch failed
/// and was already reported.
async fn crawl<F: PageFetcher>(
    fetcher: &F,
    config: &CrawlConfig,
) -> Result<Option<CrawlReport>> {
    let extractor = Extractor::eventbrite()?;
    let spinner = create_spinner(&state_message(CrawlState::Init, &config.target.url));

    let result = run_crawl(fetcher, &extractor, config, |state| {
        spinner.set_message(state_message(state, &config.target.url));
    })
    .await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => Ok(Some(report)),
        Err(CrawlError::FetchFailed { reason, .. }) => {
            eprintln!("{} {}", style("Failed to crawl:").red().bold(), reason);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_sink(label: &str, sink: &SinkReport) -> bool {
    match &sink.result {
        Ok(()) => {
            println!(
                "{} {} have been saved to {}",
                style("✓").green().bold(),
                label,
                style(sink.path.display()).cyan()
            );
            true
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red().bold(), e);
            false
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let fetch_config = FetchConfig {
        timeout: Duration::from_secs(cli.timeout),
        ..FetchConfig::default()
    };
    let config = CrawlConfig {
        target: FetchTarget::new(cli.url),
        output_dir: cli.output_dir,
        encoding: cli.encoding.into(),
    };

    println!(
        "\n{}  {}\n",
        style("eventcrawl").cyan().bold(),
        style("Event Listing Crawler").dim()
    );

    let report = match (cli.html, cli.fetcher) {
        (Some(path), _) => {
            debug!(file = %path.display(), "using file fetcher");
            crawl(&FileFetcher::new(path), &config).await?
        }
        (None, CliFetcher::Http) => {
            debug!(timeout = ?fetch_config.timeout, "using http fetcher");
            crawl(&HttpFetcher::new(&fetch_config)?, &config).await?
        }
        (None, CliFetcher::Browser) => {
            debug!(executable = ?cli.browser_path, timeout = ?fetch_config.timeout, "using browser fetcher");
            let mut fetcher = BrowserFetcher::new(cli.browser.into(), fetch_config);
            if let Some(path) = cli.browser_path {
                fetcher = fetcher.with_executable(path);
            }
            crawl(&fetcher, &config).await?
        }
    };

    let Some(report) = report else {
        return Ok(false);
    };

    println!(
        "{} Successfully crawled {} events",
        style("✓").green().bold(),
        style(report.event_count).yellow()
    );
    let json_ok = print_sink("Events", &report.json);
    let markdown_ok = print_sink("Formatted events", &report.markdown);

    if cli.print {
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", report.document);
    }

    Ok(json_ok && markdown_ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", style("Error occurred:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
