//! Command-line interface for the content gateway.
//!
//! Provides commands for resolving records, listing collections, probing
//! connectivity, resolving media references, subscribing an address, and
//! running the HTTP service.

use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::adapters::{BeehiivClient, StrapiClient};
use crate::config;
use crate::newsletter::{Attribution, Subscriber};
use crate::resolve::{resolve_media_url, Prober};

/// contentgw - Headless-CMS content gateway
#[derive(Parser, Debug)]
#[command(name = "contentgw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a record by numeric id or slug
    Resolve {
        /// Numeric id or slug
        identifier: String,

        /// Probe only this collection instead of the configured list
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// List records from the first answering collection
    List {
        /// List only this collection instead of the configured list
        #[arg(short, long)]
        collection: Option<String>,

        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Check content API connectivity across the configured collections
    Probe,

    /// Resolve a media reference (JSON argument, or stdin if omitted) to a URL
    Media {
        /// Media reference as JSON
        json: Option<String>,
    },

    /// Subscribe an email address to the newsletter
    Subscribe {
        /// Email address
        email: String,
    },

    /// Start the HTTP service
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        address: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Resolve {
                identifier,
                collection,
            } => resolve_record(&identifier, collection).await,
            Commands::List { collection, limit } => list_records(collection, limit).await,
            Commands::Probe => probe_collections().await,
            Commands::Media { json } => resolve_media(json).await,
            Commands::Subscribe { email } => subscribe(&email).await,
            Commands::Serve { address } => crate::server::serve(&address).await,
            Commands::Config => show_config(),
        }
    }
}

/// Build a prober from the resolved configuration
fn prober() -> Result<Prober<StrapiClient>> {
    let cfg = config::config()?;
    Ok(Prober::new(
        StrapiClient::from_config(cfg),
        cfg.slug_fields.clone(),
    ))
}

/// Collections to sweep for a single record: an override, or the
/// configured list
fn collections(overridden: Option<String>) -> Result<Vec<String>> {
    match overridden {
        Some(name) => Ok(vec![name]),
        None => Ok(config::config()?.collections.clone()),
    }
}

/// Resolve a record and print it as JSON
async fn resolve_record(identifier: &str, collection: Option<String>) -> Result<()> {
    let prober = prober()?;
    let candidates = collections(collection)?;

    match prober.find_record(identifier, &candidates).await {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(record.fields())?);
            Ok(())
        }
        None => anyhow::bail!(
            "No record found for '{}' (tried: {})",
            identifier,
            candidates.join(", ")
        ),
    }
}

/// List records as a table
async fn list_records(collection: Option<String>, limit: usize) -> Result<()> {
    let prober = prober()?;
    // Listing probes the main-page collection candidates, not the
    // per-record ones
    let candidates = match collection {
        Some(name) => vec![name],
        None => config::config()?.list_collections.clone(),
    };

    let records = prober.list_records(&candidates).await;
    if records.is_empty() {
        println!("No records found (tried: {})", candidates.join(", "));
        return Ok(());
    }

    println!("{:<8} {:<30} {:<50}", "ID", "SLUG", "TITLE");
    println!("{}", "-".repeat(90));

    for record in records.iter().take(limit) {
        let title = record.extract(&["title", "name", "heading"], "Untitled Content");
        let title_truncated = truncate_title(&title, 47);
        println!(
            "{:<8} {:<30} {:<50}",
            record.id(),
            record.slug(),
            title_truncated
        );
    }

    println!("\nTotal: {} records", records.len());

    Ok(())
}

/// Truncate a title to at most `max` characters, marking the cut with an
/// ellipsis. Cuts on character boundaries, so multibyte titles are safe.
fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let head: String = title.chars().take(max).collect();
    format!("{}...", head)
}

/// Probe connectivity and report the first answering collection
async fn probe_collections() -> Result<()> {
    let cfg = config::config()?;
    let prober = prober()?;

    match prober.probe_collections(&cfg.collections).await {
        Some(report) => {
            println!(
                "Content API reachable via '{}' ({} items)",
                report.collection, report.total
            );
            Ok(())
        }
        None => anyhow::bail!(
            "Failed to reach any collection at {} (tried: {})",
            cfg.cms_url,
            cfg.collections.join(", ")
        ),
    }
}

/// Resolve a media reference to a URL
async fn resolve_media(json: Option<String>) -> Result<()> {
    let cfg = config::config()?;

    let input = match json {
        Some(json) => json,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
    };

    if input.trim().is_empty() {
        anyhow::bail!("No input provided. Pass a JSON argument or pipe to stdin");
    }

    let value: Value = serde_json::from_str(&input).context("Input is not valid JSON")?;

    let url = resolve_media_url(&value, &cfg.cms_url);
    if url.is_empty() {
        anyhow::bail!("No usable media URL found in the input");
    }

    println!("{}", url);
    Ok(())
}

/// Run the subscription flow from the terminal
async fn subscribe(email: &str) -> Result<()> {
    let cfg = config::config()?;
    let subscriber = Subscriber::new(cfg.beehiiv.clone().map(BeehiivClient::new));

    match subscriber.subscribe(email, &Attribution::default()).await {
        Ok(data) => {
            println!("Subscribed {}", email);
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Err(e) => anyhow::bail!("Subscription failed: {}", e),
    }
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("contentgw configuration");
    println!("{}", "-".repeat(40));
    println!(
        "Config file:   {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Content API:   {}", cfg.cms_url);
    println!("Revalidate:    {}s", cfg.revalidate_seconds);
    println!("Collections:   {}", cfg.collections.join(", "));
    println!("List colls:    {}", cfg.list_collections.join(", "));
    println!("Slug fields:   {}", cfg.slug_fields.join(", "));
    println!(
        "Extra origins: {}",
        if cfg.extra_origins.is_empty() {
            "(none)".to_string()
        } else {
            cfg.extra_origins.join(", ")
        }
    );
    println!(
        "Newsletter:    {}",
        if cfg.beehiiv.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_title_short_titles_pass_through() {
        assert_eq!(truncate_title("Morning Routines", 47), "Morning Routines");
        assert_eq!(truncate_title("", 47), "");
    }

    #[test]
    fn test_truncate_title_long_titles_get_an_ellipsis() {
        let long = "a".repeat(60);
        let truncated = truncate_title(&long, 47);
        assert_eq!(truncated.len(), 50);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_title_cuts_multibyte_titles_on_char_boundaries() {
        // 24 two-byte chars: 48 bytes, no byte boundary at 47
        let title = "Å".repeat(24);
        let truncated = truncate_title(&title, 47);
        assert_eq!(truncated.chars().count(), 27);
        assert!(truncated.starts_with('Å'));
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_title_exact_length_is_untouched() {
        let title = "x".repeat(47);
        assert_eq!(truncate_title(&title, 47), title);
    }
}
