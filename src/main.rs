//! CLI entry point for the media auto saver.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use media_saver_core::{
    Database, LinkDispatcher, LinkProcessor, LinkStore, MonitorConfig, MonitorScheduler, NewLink,
    ToolDownloader, extract_site_name,
};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let config = build_config(&args)?;
    debug!(?config, "effective configuration");

    let db = Database::new(&args.db).await?;
    let store = LinkStore::new(db.clone());

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => run_monitor(store, config).await,
        Command::Add {
            url,
            kind,
            name,
            cookies,
        } => add_link(&store, url, kind, name, cookies).await,
        Command::List => list_links(&store).await,
        Command::Trigger { id } => trigger_link(&store, config, id).await,
        Command::History { link_id, limit } => show_history(&store, link_id, limit).await,
        Command::Enable { id, off } => {
            store.set_enabled(id, !off).await?;
            println!("Link {id} {}", if off { "disabled" } else { "enabled" });
            Ok(())
        }
        Command::Remove { id } => {
            store.remove(id).await?;
            println!("Removed link {id}");
            Ok(())
        }
    };

    db.close().await;
    result
}

/// Builds the effective configuration: file values (when given) with CLI
/// overrides applied on top.
fn build_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MonitorConfig::default(),
    };

    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_downloads = usize::from(concurrency);
    }
    if let Some(interval) = args.interval {
        config.interval_minutes = interval;
    }
    if let Some(media_root) = &args.media_root {
        config.media_root.clone_from(media_root);
    }

    config.validate()?;
    Ok(config)
}

/// Wires up the full monitoring stack over the store.
fn build_dispatcher(store: &LinkStore, config: &Arc<MonitorConfig>) -> Arc<LinkDispatcher> {
    let downloader = Arc::new(ToolDownloader::new(Arc::clone(config)));
    let processor = Arc::new(LinkProcessor::new(store.clone(), downloader));
    Arc::new(LinkDispatcher::new(
        store.clone(),
        processor,
        config.max_concurrent_downloads,
    ))
}

async fn run_monitor(store: LinkStore, config: MonitorConfig) -> Result<()> {
    std::fs::create_dir_all(&config.media_root).with_context(|| {
        format!(
            "creating media root directory {}",
            config.media_root.display()
        )
    })?;

    let config = Arc::new(config);
    let dispatcher = build_dispatcher(&store, &config);
    let scheduler = MonitorScheduler::new(store, dispatcher, config.interval_minutes);

    let reset = scheduler.startup_reset().await?;
    info!(reset, "startup recovery complete");

    tokio::select! {
        () = scheduler.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for shutdown signal")?;
            info!("shutdown signal received, stopping");
        }
    }

    Ok(())
}

async fn add_link(
    store: &LinkStore,
    url: String,
    kind: cli::CliLinkKind,
    name: Option<String>,
    cookies: Option<String>,
) -> Result<()> {
    let site_name = extract_site_name(&url);
    if site_name.is_none() {
        warn!(url = %url, "could not determine a site name from the URL");
    }

    let id = store
        .add(&NewLink {
            url: url.clone(),
            kind: Some(kind.into()),
            site_name: site_name.clone(),
            name,
            cookies_path: cookies,
            settings: None,
        })
        .await?;

    println!(
        "Added link {id}: {url} ({})",
        site_name.as_deref().unwrap_or("unknown site")
    );
    Ok(())
}

async fn list_links(store: &LinkStore) -> Result<()> {
    let links = store.list_all().await?;
    if links.is_empty() {
        println!("No links registered");
        return Ok(());
    }

    for link in links {
        let flag = if link.is_enabled { "" } else { " (disabled)" };
        println!(
            "{:>4}  {:<11} {:<7} {}{}",
            link.id,
            link.status().as_str(),
            link.kind().as_str(),
            link.url,
            flag
        );
        if let Some(message) = &link.error_message {
            println!("      last error: {message}");
        }
    }
    Ok(())
}

async fn trigger_link(store: &LinkStore, config: MonitorConfig, id: i64) -> Result<()> {
    std::fs::create_dir_all(&config.media_root).with_context(|| {
        format!(
            "creating media root directory {}",
            config.media_root.display()
        )
    })?;

    let config = Arc::new(config);
    let dispatcher = build_dispatcher(store, &config);
    dispatcher.trigger_link(id).await?;

    if let Some(link) = store.get(id).await? {
        println!(
            "Link {id} processed, status: {}{}",
            link.status().as_str(),
            link.error_message
                .as_deref()
                .map(|message| format!(" ({message})"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

async fn show_history(store: &LinkStore, link_id: i64, limit: i64) -> Result<()> {
    let total = store.count_history_for_link(link_id).await?;
    let rows = store.history_for_link(link_id, limit, 0).await?;

    if rows.is_empty() {
        println!("No history for link {link_id}");
        return Ok(());
    }

    for row in &rows {
        let files = row.parse_downloaded_files();
        println!(
            "{}  {:<7} files={}{}",
            row.timestamp,
            row.status().as_str(),
            files.len(),
            row.error_message
                .as_deref()
                .map(|message| format!("  {message}"))
                .unwrap_or_default()
        );
    }
    println!("showing {} of {total} entries", rows.len());
    Ok(())
}
