//! Stacklinks CLI - seed a local store and search it.
//!
//! Usage:
//!     stacklinks --db links.sqlite seed
//!     stacklinks --db links.sqlite search "rust async" -n 5
//!     stacklinks --db links.sqlite stats
//!     stacklinks --db links.sqlite share <collection-id> --base https://stacklinks.app
//!
//! Logging follows `RUST_LOG`, defaulting to `stacklinks=info`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use stacklinks::fields::Searchable;
use stacklinks::models::{NewCollection, NewLink};
use stacklinks::ranking::{score_record, Query};
use stacklinks::{share, Collection, DashboardStats, Link, LinkStore, SearchConfig, Visibility};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stacklinks", version, about)]
struct Cli {
    /// SQLite database file (created if missing)
    #[arg(long, default_value = "stacklinks.sqlite")]
    db: PathBuf,

    /// Owner whose working set is loaded
    #[arg(long, global = true, default_value = "demo")]
    owner: String,

    /// Search tuning as a JSON file (`debounce_ms`, `max_results`, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert the bundled demo links for the owner
    Seed,
    /// Rank the owner's links and collections against a query
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of results per list (0 for no limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dashboard summary
    Stats,
    /// Print the public URL of a collection
    Share {
        collection_id: String,
        #[arg(long, default_value = "https://stacklinks.app")]
        base: String,
    },
}

fn parse_visibility(raw: &str) -> Visibility {
    Visibility::from_database(raw).unwrap_or_default()
}

fn load_config(path: Option<&PathBuf>) -> Result<SearchConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SearchConfig::from_json(&raw)?
        }
        None => SearchConfig::default(),
    };
    Ok(config.with_overrides(|key| std::env::var(key).ok()))
}

fn seed(store: &LinkStore, owner: &str) -> Result<()> {
    if !store.working_set().collections().is_empty() {
        info!(owner, "owner already has collections, skipping seed");
        return Ok(());
    }

    let mut ids = HashMap::new();
    for demo in demo_data::collections().map_err(anyhow::Error::msg)? {
        let collection = store.create_collection(
            NewCollection::new(owner, &demo.name)
                .with_description(&demo.description)
                .with_tags(demo.tags())
                .with_visibility(parse_visibility(&demo.visibility)),
        )?;
        ids.insert(demo.key.as_str(), collection.id);
    }

    let mut added = 0;
    for demo in demo_data::links().map_err(anyhow::Error::msg)? {
        let collection_id = ids
            .get(demo.collection.as_str())
            .with_context(|| format!("unknown demo collection {}", demo.collection))?;
        store.add_link(
            NewLink::new(owner, collection_id, &demo.title, &demo.url)
                .with_description(&demo.description)
                .with_tags(demo.tags())
                .with_visibility(parse_visibility(&demo.visibility))
                .pinned(demo.pinned),
        )?;
        added += 1;
    }

    println!("Seeded {} collections and {} links for {}", ids.len(), added, owner);
    Ok(())
}

async fn search(store: &LinkStore, config: SearchConfig, query: &str, json: bool) -> Result<()> {
    let parsed = Query::parse(query);
    let link_score = |l: &Link| score_record(l, &parsed, Link::search_fields(), &config);
    let collection_score = |c: &Collection| score_record(c, &parsed, Collection::search_fields(), &config);

    let controller = store.controller(config.clone());
    controller.on_query_change(query);
    let snapshot = controller.settled().await;
    let results = &snapshot.results;

    if json {
        let output = json!({
            "query": query,
            "links": results.links,
            "collections": results.collections,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results for \"{}\"", query);
        return Ok(());
    }
    if !results.collections.is_empty() {
        println!("Collections");
        for c in &results.collections {
            println!("  {:>7.2}  {}  ({})", collection_score(c), c.name, c.id);
        }
    }
    if !results.links.is_empty() {
        println!("Links");
        for l in &results.links {
            println!("  {:>7.2}  {}  {}", link_score(l), l.title, l.url);
        }
    }
    Ok(())
}

fn stats(store: &LinkStore) {
    let stats = DashboardStats::from_working_set(store.working_set());
    println!("Links:       {} ({} public, {} private)", stats.total_links, stats.public_links, stats.private_links);
    println!("Collections: {}", stats.total_collections);
    println!("Recent");
    for link in &stats.recent_links {
        println!("  {}  {}", link.created_at.format("%Y-%m-%d"), link.title);
    }
    println!("Largest collections");
    for entry in &stats.top_collections {
        println!("  {:>3}  {}", entry.links, entry.collection.name);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stacklinks=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(cli.config.as_ref())?;
    let store = LinkStore::open(&cli.db).with_context(|| format!("opening {}", cli.db.display()))?;
    store.load(&cli.owner).await?;

    match cli.command {
        Command::Seed => seed(&store, &cli.owner)?,
        Command::Search { query, limit, json } => {
            let query = query.join(" ");
            if limit.is_some() {
                config = config.with_max_results(limit);
            }
            // One-shot query, nothing to debounce
            config.debounce = std::time::Duration::ZERO;
            search(&store, config, &query, json).await?;
        }
        Command::Stats => stats(&store),
        Command::Share { collection_id, base } => {
            let collection = store
                .working_set()
                .find_collection(&collection_id)
                .with_context(|| format!("no collection {collection_id} for {}", cli.owner))?;
            println!("{}", share::share_url(&base, &collection)?);
        }
    }

    Ok(())
}
