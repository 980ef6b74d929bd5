//! Command-line commands, one per lifecycle event plus inspection helpers.

use anyhow::{bail, Context, Result};
use assetcache_core::utils::{format_size, truncate_string};
use assetcache_core::{Notification, OfflineWorker, PushMessage, Request, ResponseSource};

/// Longest URL shown in the `list` table.
const MAX_URL_WIDTH: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Install,
    Activate,
    Lifecycle,
    Fetch(String),
    Push(Option<String>),
    Click,
    List,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(name) = args.first() else {
            return Ok(Command::Help);
        };
        let command = match name.as_str() {
            "install" => Command::Install,
            "activate" => Command::Activate,
            "lifecycle" => Command::Lifecycle,
            "fetch" => {
                let url = args.get(1).context("fetch requires a URL")?;
                Command::Fetch(url.clone())
            }
            "push" => Command::Push(args.get(1).cloned()),
            "click" => Command::Click,
            "list" => Command::List,
            "help" | "--help" | "-h" => Command::Help,
            other => bail!("Unknown command: {}", other),
        };
        Ok(command)
    }
}

pub const USAGE: &str = "\
Usage: assetcache <command>

Commands:
  install          Cache the asset manifest into the current cache version
  activate         Delete caches from previous versions
  lifecycle        install, then activate
  fetch <url>      Answer a request cache-first (relative URLs use the scope)
  push [payload]   Show the notification for a push payload
  click            Handle a click on the default notification
  list             List every cache and its entries

Environment:
  ASSETCACHE_CONFIG     Path to a JSON config file
  ASSETCACHE_CACHE_DIR  Directory holding the cache stores
  ASSETCACHE_LOG_DIR    Also write daily log files to this directory
  RUST_LOG              Log filter (default: warn)";

pub async fn run(command: Command, worker: &OfflineWorker) -> Result<()> {
    match command {
        Command::Install => install(worker).await,
        Command::Activate => activate(worker).await,
        Command::Lifecycle => {
            install(worker).await?;
            activate(worker).await
        }
        Command::Fetch(url) => fetch(worker, &url).await,
        Command::Push(payload) => push(worker, payload).await,
        Command::Click => {
            let notification = Notification::from_defaults(&worker.config().notification);
            worker.on_notification_click(&notification).await?;
            Ok(())
        }
        Command::List => list(worker).await,
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

async fn install(worker: &OfflineWorker) -> Result<()> {
    let report = worker.on_install().await?;
    match report.failed {
        None => println!("Installed {}: {} assets cached", report.cache_name, report.cached),
        Some(reason) => println!("Installed {} without core assets: {}", report.cache_name, reason),
    }
    Ok(())
}

async fn activate(worker: &OfflineWorker) -> Result<()> {
    let report = worker.on_activate().await?;
    if report.deleted.is_empty() {
        println!("Activated {}: no old caches", report.current);
    } else {
        println!("Activated {}: deleted {}", report.current, report.deleted.join(", "));
    }
    Ok(())
}

async fn fetch(worker: &OfflineWorker, target: &str) -> Result<()> {
    let url = worker.config().resolve(target)?;
    let request = Request::get(url);
    let outcome = worker.on_fetch(&request).await?;

    let Some(response) = outcome.response else {
        bail!("Fetch failed for {}", request.url);
    };
    let source = match outcome.source {
        ResponseSource::Cache => "cache",
        ResponseSource::Network => "network",
        ResponseSource::Fallback => "offline fallback",
        ResponseSource::NetworkFailed => "none",
    };
    println!(
        "{} {} ({}, {}, from {})",
        response.status,
        request.url,
        response.kind,
        format_size(response.content_length()),
        source
    );

    if let Some(write) = outcome.cache_write {
        let key = write.key().to_string();
        write.wait().await;
        println!("Cached {}", key);
    }
    Ok(())
}

async fn push(worker: &OfflineWorker, payload: Option<String>) -> Result<()> {
    let message = match payload {
        Some(p) => PushMessage::new(p),
        None => PushMessage::empty(),
    };
    worker.on_push(&message).await?;
    Ok(())
}

async fn list(worker: &OfflineWorker) -> Result<()> {
    let storage = worker.storage();
    let names = storage.keys().await?;
    if names.is_empty() {
        println!("No caches");
        return Ok(());
    }

    for name in names {
        let cache = storage.open(&name).await?;
        let entries = cache.entries().await?;
        let marker = if name == worker.config().cache_name { " (current)" } else { "" };
        println!("{}{}: {} entries", name, marker, entries.len());
        for entry in entries {
            println!(
                "  {:<width$} {:>4} {:>9}  {}",
                truncate_string(&entry.data.key.url, MAX_URL_WIDTH),
                entry.data.status,
                format_size(entry.data.size),
                entry.age_display(),
                width = MAX_URL_WIDTH
            );
        }
    }
    Ok(())
}
