use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gazette::article::{Article, Category};
use gazette::config::Config;
use gazette::service::{NewsService, RELATED_LIMIT, TRENDING_LIMIT};
use gazette::storage::{Bookmarks, Database, DatabaseError, KeyValueStore, MemoryStore};
use gazette::util::truncate_to_width;

/// Articles printed by the previous listing, so ids can be resolved later.
const LAST_RESULTS_KEY: &str = "cli.last_results";
const TITLE_WIDTH: usize = 72;

/// Get the config directory path (~/.config/gazette/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("gazette"))
}

#[derive(Parser, Debug)]
#[command(name = "gazette", about = "News headlines and a daily journal from several providers")]
struct Args {
    /// Config file (default: ~/.config/gazette/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use built-in articles and quotes; no network access
    #[arg(long)]
    offline: bool,

    /// Keep nothing on disk for this run
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Latest headlines, optionally for one category
    Headlines {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Search every provider and the journal
    Search { query: String },
    /// Trending articles across providers
    Trending {
        #[arg(long, default_value_t = TRENDING_LIMIT)]
        limit: usize,
    },
    /// Today's journal entries
    Journal {
        /// Regenerate even if today's entries are cached
        #[arg(long)]
        refresh: bool,
    },
    /// Print one article in full
    Show { id: String },
    /// Articles related to one from a previous listing
    Related {
        id: String,
        #[arg(long, default_value_t = RELATED_LIMIT)]
        limit: usize,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Poll for new journal content until interrupted
    Watch {
        /// Seconds between checks (default: poll_interval_secs from config)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum BookmarkAction {
    Add { id: String },
    Remove { id: String },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if args.offline {
        config.offline = true;
    }

    let store = open_store(&args, &config, &config_dir).await?;
    let service = NewsService::from_config(&config, Arc::clone(&store))?;

    match args.command {
        Command::Headlines { category, limit } => {
            let mut articles = match category {
                Some(c) => service.fetch_articles_by_category(c).await,
                None => service.fetch_all_articles(false).await,
            };
            articles.truncate(limit);
            list(store.as_ref(), &articles).await;
        }
        Command::Search { query } => {
            let articles = service.search_all_articles(&query).await;
            list(store.as_ref(), &articles).await;
        }
        Command::Trending { limit } => {
            let articles = service.fetch_trending_articles(limit).await;
            list(store.as_ref(), &articles).await;
        }
        Command::Journal { refresh } => {
            let articles = service.journal().get_daily_entries(refresh).await;
            list(store.as_ref(), &articles).await;
        }
        Command::Show { id } => {
            let article = resolve(&service, store.as_ref(), &id).await?;
            show(&article);
        }
        Command::Related { id, limit } => {
            let article = resolve(&service, store.as_ref(), &id).await?;
            let related = service
                .fetch_related_articles(&article.id, article.primary_category(), limit)
                .await;
            list(store.as_ref(), &related).await;
        }
        Command::Bookmark { action } => {
            let bookmarks = Bookmarks::load(Arc::clone(&store)).await?;
            match action {
                BookmarkAction::Add { id } => {
                    let article = resolve(&service, store.as_ref(), &id).await?;
                    if bookmarks.add(article).await? {
                        println!("Bookmarked {id}");
                    } else {
                        println!("Already bookmarked");
                    }
                }
                BookmarkAction::Remove { id } => {
                    if bookmarks.remove(&id).await? {
                        println!("Removed {id}");
                    } else {
                        println!("No bookmark with id {id}");
                    }
                }
                BookmarkAction::List => {
                    let articles = bookmarks.list().await;
                    if articles.is_empty() {
                        println!("No bookmarks yet");
                    }
                    print_articles(&articles);
                }
            }
        }
        Command::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.poll_interval());
            watch(&service, interval).await?;
        }
    }

    Ok(())
}

async fn open_store(
    args: &Args,
    config: &Config,
    config_dir: &Path,
) -> Result<Arc<dyn KeyValueStore>> {
    if args.ephemeral {
        tracing::debug!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db_path = match &config.database_path {
        Some(path) => path.clone(),
        None => {
            if !config_dir.exists() {
                std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
            }
            config_dir.join("gazette.db")
        }
    };
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    match Database::open(db_path_str).await {
        Ok(db) => Ok(Arc::new(db)),
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: Another instance of gazette is using the database. Please close it and try again.");
            std::process::exit(1);
        }
        Err(e) => Err(anyhow::anyhow!("Failed to open database: {}", e)),
    }
}

/// Find `id` among the previous listing, bookmarks, then the service.
async fn resolve(service: &NewsService, store: &dyn KeyValueStore, id: &str) -> Result<Article> {
    if let Some(found) = last_results(store).await.into_iter().find(|a| a.id == id) {
        return Ok(found);
    }
    if let Some(raw) = store.get(gazette::storage::BOOKMARKS_KEY).await? {
        if let Ok(saved) = serde_json::from_str::<Vec<Article>>(&raw) {
            if let Some(found) = saved.into_iter().find(|a| a.id == id) {
                return Ok(found);
            }
        }
    }
    service
        .fetch_article_by_id(id)
        .await
        .ok_or_else(|| {
            anyhow::anyhow!("No article with id {id}. List articles first, then use an id from the listing.")
        })
}

async fn last_results(store: &dyn KeyValueStore) -> Vec<Article> {
    match store.get(LAST_RESULTS_KEY).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read previous results");
            Vec::new()
        }
    }
}

/// Print and remember a listing.
async fn list(store: &dyn KeyValueStore, articles: &[Article]) {
    if articles.is_empty() {
        println!("Nothing to show");
        return;
    }
    print_articles(articles);

    match serde_json::to_string(articles) {
        Ok(json) => {
            if let Err(e) = store.set(LAST_RESULTS_KEY, &json).await {
                tracing::warn!(error = %e, "Failed to remember results");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to encode results"),
    }
}

fn print_articles(articles: &[Article]) {
    for article in articles {
        let marker = if article.trending { "*" } else { " " };
        println!(
            "{marker} {}  [{}] {}",
            article.id,
            article.primary_category(),
            truncate_to_width(&article.title, TITLE_WIDTH)
        );
        println!(
            "    {} · {}",
            article.source,
            article.published_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn show(article: &Article) {
    println!("{}", article.title);
    println!(
        "{} · {} · {}",
        article.author,
        article.source,
        article.published_at.format("%Y-%m-%d %H:%M UTC")
    );
    let categories: Vec<&str> = article.categories.iter().map(|c| c.as_str()).collect();
    println!("Categories: {}", categories.join(", "));
    println!();
    println!("{}", article.summary);
    println!();
    println!("{}", gazette::util::strip_html_tags(&article.content));
    println!();
    println!("{}", article.url);
}

async fn watch(service: &NewsService, interval: Duration) -> Result<()> {
    let status = service.subscribe_to_checking_status(|checking| {
        if *checking {
            tracing::info!("Checking for new content");
        }
    });
    let updates = service.subscribe_to_updates(|entries| {
        println!("{} new journal entries:", entries.len());
        print_articles(entries);
    });

    service.start_polling(interval);
    println!(
        "Watching every {}s, press Ctrl-C to stop",
        interval.as_secs()
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    service.stop_polling();
    status.unsubscribe();
    updates.unsubscribe();
    println!("Goodbye!");
    Ok(())
}
