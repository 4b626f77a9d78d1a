//! Command-line entry point: crawl one site and print its Brand Kit as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use url::Url;

use brandprobe::crawl::{run_job, InMemoryJobStore, JobRequest};
use brandprobe::renderer::chrome::ChromeRenderer;
use brandprobe::synthesis::{HttpTextGenerator, NullTextGenerator, TextGenerator};
use brandprobe::CrawlLimits;

#[derive(Parser)]
#[command(name = "brandprobe", version, about = "Discover a website's brand kit")]
struct Cli {
    /// Seed URL to crawl (scheme optional, https assumed).
    url: String,

    /// Brand name hint, skips inference from page metadata.
    #[arg(long)]
    brand: Option<String>,

    /// Industry hint passed to the text-generation collaborator.
    #[arg(long)]
    industry: Option<String>,

    /// Override the page cap.
    #[arg(long)]
    max_pages: Option<usize>,

    /// Override the link depth cap.
    #[arg(long)]
    max_depth: Option<u32>,

    /// Pretty-print the output JSON.
    #[arg(long)]
    pretty: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("brandprobe=info".parse().expect("valid directive"));
    if std::env::var("BRANDPROBE_LOG_JSON").is_ok_and(|v| !v.is_empty()) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn parse_seed(raw: &str) -> Result<Url> {
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(_) => Url::parse(&format!("https://{raw}"))
            .with_context(|| format!("invalid seed url: {raw}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let seed = parse_seed(&cli.url)?;

    let mut limits = CrawlLimits::from_env();
    if let Some(pages) = cli.max_pages {
        limits.max_pages = pages;
    }
    if let Some(depth) = cli.max_depth {
        limits.max_depth = depth;
    }

    let client = reqwest::Client::new();
    let generator: Box<dyn TextGenerator> = match HttpTextGenerator::from_env(client) {
        Some(g) => Box::new(g),
        None => {
            info!("no text generation endpoint configured, voice copy will use fallbacks");
            Box::new(NullTextGenerator)
        }
    };

    let renderer = ChromeRenderer::launch(&limits)
        .await
        .context("launching headless browser")?;

    let store = InMemoryJobStore::new();
    let request = JobRequest {
        seed,
        brand_hint: cli.brand,
        industry_hint: cli.industry,
    };

    let result = run_job(&store, &renderer, generator.as_ref(), &limits, request).await;
    renderer.shutdown().await;

    let kit = result.context("brand discovery failed")?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&kit)?
    } else {
        serde_json::to_string(&kit)?
    };
    println!("{json}");

    Ok(())
}
