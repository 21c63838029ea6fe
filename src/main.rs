//! vod-search CLI - Aggregated video catalog search from the command line.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use vod_search::{
    parse_play_url, parse_tvbox_play_url, Aggregator, CancellationToken, CatalogClient, Endpoint,
    SearchError, Settings, SettingsStore, VideoItem, VideoSource,
};

/// vod-search - Search many video catalog APIs at once
#[derive(Parser)]
#[command(name = "vod-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings document with the configured sources
    #[arg(short, long, global = true, default_value = "sources.json")]
    config: String,

    /// Send requests through the proxy relay at this origin
    /// (e.g., http://localhost:3000) instead of calling APIs directly
    #[arg(long, global = true)]
    relay: Option<String>,

    /// Outbound proxy URL (e.g., http://127.0.0.1:8080 or socks5://127.0.0.1:1080)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search enabled sources
    Search(SearchArgs),

    /// Show one video and its episodes
    Detail(DetailArgs),

    /// List a source's categories
    Categories {
        /// Source id
        source: String,
    },

    /// Browse a source's catalog
    Browse(BrowseArgs),

    /// Resolve an episode to a playable URL
    Play {
        /// Source id
        source: String,

        /// Episode URL or play id
        play_id: String,

        /// Play flag (TVBox sources)
        #[arg(long)]
        flag: Option<String>,
    },

    /// List configured sources
    Sources,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search keyword
    query: String,

    /// Sources to search (comma-separated ids). Defaults to all enabled sources
    #[arg(short, long, value_delimiter = ',')]
    sources: Option<Vec<String>>,

    /// Wait for every source and print once instead of streaming
    #[arg(long)]
    all: bool,

    /// Page number
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Maximum number of results to display
    #[arg(short, long, default_value = "20")]
    limit: usize,

    /// Resolve missing cover images
    #[arg(long)]
    covers: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser)]
struct DetailArgs {
    /// Source id
    source: String,

    /// Video id
    id: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser)]
struct BrowseArgs {
    /// Source id
    source: String,

    /// Category id
    #[arg(short = 't', long)]
    category: Option<String>,

    /// Page number
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// TVBox filter as key=value (repeatable)
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load(&cli.config).await?;
    if let Some(proxy) = cli.proxy {
        settings.client.http_proxy = Some(proxy);
    }
    let endpoint = match &cli.relay {
        Some(origin) => Endpoint::relay(origin)?,
        None => Endpoint::Direct,
    };

    match cli.command {
        Commands::Sources => list_sources(&settings),
        Commands::Search(args) => run_search(settings, endpoint, args).await,
        Commands::Detail(args) => run_detail(settings, endpoint, args).await,
        Commands::Categories { source } => run_categories(settings, endpoint, &source).await,
        Commands::Browse(args) => run_browse(settings, endpoint, args).await,
        Commands::Play {
            source,
            play_id,
            flag,
        } => run_play(settings, endpoint, &source, &play_id, flag.as_deref()).await,
    }
}

fn parse_filter(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("invalid filter '{}', expected key=value", s))
}

fn find_source(settings: &Settings, id: &str) -> Result<VideoSource> {
    Ok(settings
        .find_source(id)
        .ok_or_else(|| SearchError::UnknownSource(id.to_string()))?)
}

fn list_sources(settings: &Settings) -> Result<()> {
    println!("Configured video sources:\n");
    for source in settings.sources() {
        println!(
            "  {:<12} {:<16} {:<7} {}{}",
            source.id,
            source.name,
            format!("{:?}", source.source_type).to_lowercase(),
            source.api_url,
            if source.enabled { "" } else { " (disabled)" }
        );
    }
    if let Some(url) = settings.proxy_settings().as_ref().and_then(|p| p.active_url()) {
        println!("\nAcceleration relay: {}", url);
    }
    println!();
    println!("Usage: vod-search search \"关键词\" -s bfzy,ffzy");
    Ok(())
}

async fn run_search(settings: Settings, endpoint: Endpoint, args: SearchArgs) -> Result<()> {
    let sources = match &args.sources {
        Some(ids) => ids
            .iter()
            .map(|id| find_source(&settings, id))
            .collect::<Result<Vec<_>>>()?,
        None => settings.enabled_sources(),
    };
    if sources.is_empty() {
        anyhow::bail!("No enabled video sources in settings");
    }

    let client = Arc::new(CatalogClient::from_settings(settings, endpoint)?);

    let mut results = if args.all {
        let page = client.search_videos_all(&sources, &args.query, args.page).await?;
        page.list
    } else {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });

        let streaming = matches!(args.format, OutputFormat::Text);
        let aggregator = Aggregator::new(Arc::clone(&client));
        let outcome = aggregator
            .aggregated_search(
                &sources,
                &args.query,
                move |batch| {
                    if streaming {
                        if let Some(source) = batch.first().and_then(|i| i.source_name.as_deref()) {
                            eprintln!("  {} returned {} results", source, batch.len());
                        }
                    }
                },
                Some(&token),
                args.page,
            )
            .await;

        match outcome {
            Ok(results) => results,
            Err(e) if e.is_cancelled() => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    };
    results.truncate(args.limit);

    if args.covers {
        let missing: Vec<VideoItem> = results.iter().filter(|i| !i.has_cover()).cloned().collect();
        let covers = client.batch_get_video_covers(&missing, &sources).await;
        for item in &mut results {
            if !item.has_cover() {
                if let Some(cover) = covers.get(&item.vod_id) {
                    item.vod_pic = Some(cover.clone());
                }
            }
        }
    }

    match args.format {
        OutputFormat::Text => {
            println!("\nSearch results for \"{}\" ({} results):\n", args.query, results.len());
            for (i, item) in results.iter().enumerate() {
                println!("{}. {}", i + 1, item.vod_name);
                println!(
                    "   Source: {} | ID: {}",
                    item.source_name.as_deref().unwrap_or("-"),
                    item.vod_id
                );
                let meta: Vec<&str> = [&item.type_name, &item.vod_year, &item.vod_remarks]
                    .into_iter()
                    .filter_map(|v| v.as_deref())
                    .filter(|v| !v.is_empty())
                    .collect();
                if !meta.is_empty() {
                    println!("   {}", meta.join(" | "));
                }
                if let Some(cover) = item.cover() {
                    println!("   Cover: {}", cover);
                }
                println!();
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Compact => {
            for item in &results {
                println!(
                    "{}\t{}\t{}",
                    item.source_id.as_deref().unwrap_or("-"),
                    item.vod_id,
                    item.vod_name
                );
            }
        }
    }

    Ok(())
}

async fn run_detail(settings: Settings, endpoint: Endpoint, args: DetailArgs) -> Result<()> {
    let source = find_source(&settings, &args.source)?;
    let client = CatalogClient::from_settings(settings, endpoint)?;
    let detail = client.get_video_detail(&source, &args.id).await?;

    let play_url = detail.vod_play_url.as_deref().unwrap_or_default();
    let episodes = if source.is_tvbox() {
        parse_tvbox_play_url(play_url)
    } else {
        parse_play_url(play_url)
    };

    match args.format {
        OutputFormat::Text => {
            println!("\n{} ({})", detail.vod_name, source.name);
            for (label, value) in [
                ("Type", &detail.type_name),
                ("Year", &detail.vod_year),
                ("Area", &detail.vod_area),
                ("Director", &detail.vod_director),
                ("Cast", &detail.vod_actor),
                ("Cover", &detail.vod_pic),
            ] {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    println!("   {}: {}", label, value);
                }
            }
            if let Some(blurb) = detail.vod_blurb.as_deref().or(detail.vod_content.as_deref()) {
                println!("\n   {}", blurb.trim());
            }
            println!("\nEpisodes ({}):", episodes.len());
            for episode in &episodes {
                println!("  [{}] {}  {}", episode.index, episode.label, episode.url);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "detail": detail, "episodes": episodes });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Compact => {
            for episode in &episodes {
                println!("{}\t{}", episode.label, episode.url);
            }
        }
    }

    Ok(())
}

async fn run_categories(settings: Settings, endpoint: Endpoint, source_id: &str) -> Result<()> {
    let source = find_source(&settings, source_id)?;
    let client = CatalogClient::from_settings(settings, endpoint)?;

    for category in client.list_categories(&source).await? {
        println!("{}\t{}", category.type_id, category.type_name);
    }
    Ok(())
}

async fn run_browse(settings: Settings, endpoint: Endpoint, args: BrowseArgs) -> Result<()> {
    let source = find_source(&settings, &args.source)?;
    let client = CatalogClient::from_settings(settings, endpoint)?;
    let filters: BTreeMap<String, String> = args.filters.into_iter().collect();

    let page = client
        .list_videos(&source, args.page, args.category.as_deref(), &filters)
        .await?;

    match args.format {
        OutputFormat::Text => {
            println!(
                "\n{} page {}/{} ({} total):\n",
                source.name, page.page, page.page_count, page.total
            );
            for item in &page.list {
                println!(
                    "  {:<10} {}  {}",
                    item.vod_id,
                    item.vod_name,
                    item.vod_remarks.as_deref().unwrap_or_default()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Compact => {
            for item in &page.list {
                println!("{}\t{}", item.vod_id, item.vod_name);
            }
        }
    }
    Ok(())
}

async fn run_play(
    settings: Settings,
    endpoint: Endpoint,
    source_id: &str,
    play_id: &str,
    flag: Option<&str>,
) -> Result<()> {
    let source = find_source(&settings, source_id)?;
    let client = CatalogClient::from_settings(settings, endpoint)?;
    let target = client.resolve_play(&source, play_id, flag).await?;

    println!("{}", target.url);
    if target.parse {
        eprintln!("Note: this URL is a web page and needs a parser to play");
    }
    Ok(())
}
