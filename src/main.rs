// Allow panic/unwrap/expect in tests (denied globally via Cargo.toml lints)
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing
    )
)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use content_store::config::{load_settings, Settings};
use content_store::logging::{init_logging, LogConfig};
use content_store::store::{
    parse_date_bound, ContentFilters, ContentStatus, ContentStore, NewContent, Platform,
    SortField, SortOptions, StoreError,
};
use content_store::{FileKv, KvStore};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Content Store - indexed local object store for content records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (default: ~/.content-store/config.toml)
    #[arg(long, env = "CONTENT_STORE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the stored values (default: ~/.content-store/data)
    #[arg(long, env = "CONTENT_STORE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Prefix for every storage key
    #[arg(long, env = "CONTENT_STORE_KEY_PREFIX")]
    key_prefix: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "CONTENT_STORE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log format
    #[arg(long, env = "CONTENT_STORE_LOG_JSON", default_value = "false")]
    log_json: bool,

    /// Log rotation period: daily, hourly, or never
    #[arg(long, env = "CONTENT_STORE_LOG_ROTATION")]
    log_rotation: Option<String>,

    /// Custom log directory (default: ~/.content-store/logs)
    #[arg(long, env = "CONTENT_STORE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show total and per-status counts
    Stats,
    /// List records matching the given filters
    List(ListArgs),
    /// Show one record
    Get { id: String },
    /// Create a record
    Create(CreateArgs),
    /// Move a record to another status
    UpdateStatus { id: String, status: ContentStatus },
    /// Copy a record into a new draft
    Duplicate { id: String },
    /// Delete one or more records
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Convert a legacy snapshot to the indexed layout
    Migrate,
    /// Recompute every index from the stored records
    Rebuild,
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    #[arg(long)]
    status: Option<ContentStatus>,

    #[arg(long)]
    platform: Option<Platform>,

    /// Case-insensitive text to find in title or caption
    #[arg(long)]
    search: Option<String>,

    /// Earliest createdAt, RFC 3339 or YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,

    /// Latest createdAt, RFC 3339 or YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,

    /// Field to sort by (createdAt, updatedAt, scheduledAt, publishedAt, title, status, or
    /// any extra field)
    #[arg(long)]
    sort: Option<SortField>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,
}

#[derive(clap::Args, Debug)]
struct CreateArgs {
    /// Explicit ID (default: a new UUID)
    #[arg(long)]
    id: Option<String>,

    #[arg(long, default_value = "")]
    title: String,

    #[arg(long, default_value = "")]
    caption: String,

    #[arg(long)]
    status: Option<ContentStatus>,

    /// Target platform; repeat for several
    #[arg(long = "platform")]
    platforms: Vec<Platform>,

    #[arg(long)]
    scheduled_at: Option<String>,
}

/// Merge command-line overrides into the loaded settings.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = load_settings(args.config.as_deref()).wrap_err("Failed to load settings")?;
    if let Some(dir) = &args.data_dir {
        settings.store.data_dir = Some(dir.clone());
    }
    if let Some(prefix) = &args.key_prefix {
        settings.store.key_prefix.clone_from(prefix);
    }
    if let Some(level) = &args.log_level {
        settings.log.level.clone_from(level);
    }
    if args.log_json {
        settings.log.json = true;
    }
    if let Some(rotation) = &args.log_rotation {
        settings.log.rotation.clone_from(rotation);
    }
    if let Some(dir) = &args.log_dir {
        settings.log.dir = Some(dir.clone());
    }
    Ok(settings)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn build_filters(args: &ListArgs) -> ContentFilters {
    let mut filters = ContentFilters::new().created_between(
        args.from.as_deref().and_then(|v| parse_date_bound(v, false)),
        args.to.as_deref().and_then(|v| parse_date_bound(v, true)),
    );
    filters.status = args.status;
    filters.platform = args.platform;
    filters.search.clone_from(&args.search);
    filters
}

async fn run<K: KvStore>(store: &ContentStore<K>, command: Command) -> Result<()> {
    match command {
        Command::Stats => print_json(&store.get_stats().await),
        Command::List(args) => {
            let filters = build_filters(&args);
            let sort = args.sort.clone().map(|field| SortOptions {
                field,
                descending: args.desc,
            });
            debug!(?filters, ?sort, "Listing content");
            print_json(&store.get_filtered(&filters, sort.as_ref()).await)
        }
        Command::Get { id } => {
            let item = store
                .get_by_id(&id)
                .await
                .ok_or_else(|| StoreError::not_found(id))?;
            print_json(&item)
        }
        Command::Create(args) => {
            let input = NewContent {
                id: args.id,
                title: args.title,
                caption: args.caption,
                status: args.status,
                platforms: args.platforms,
                scheduled_at: args.scheduled_at,
                ..NewContent::default()
            };
            print_json(&store.create(input).await?)
        }
        Command::UpdateStatus { id, status } => print_json(&store.set_status(&id, status).await?),
        Command::Duplicate { id } => print_json(&store.duplicate(&id).await?),
        Command::Delete { ids } => {
            let deleted = match ids.as_slice() {
                [id] => usize::from(store.delete(id).await?),
                _ => store.delete_many(&ids).await?,
            };
            print_json(&json!({ "deleted": deleted }))
        }
        Command::Migrate => print_json(&json!({ "migrated": store.migrate_legacy().await? })),
        Command::Rebuild => print_json(&store.rebuild_indexes().await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre error hooks for colored error output
    color_eyre::install()?;

    let args = Args::parse();
    let settings = resolve_settings(&args)?;

    let log_config = LogConfig::from_settings(&settings, settings.log_level()?);
    if let Err(e) = init_logging(&log_config) {
        eprintln!();
        eprintln!("Error: Failed to initialize logging: {e}");
        eprintln!("Logs: {}", log_config.log_file().display());
        eprintln!();
        return Err(e);
    }

    let data_dir = settings.data_dir();
    let kv = FileKv::open(&data_dir)
        .await
        .wrap_err_with(|| format!("Failed to open data directory {}", data_dir.display()))?;
    let store = ContentStore::with_config(kv, &settings.store_config());
    info!(
        data_dir = %data_dir.display(),
        prefix = store.keys().prefix(),
        "Opened content store"
    );

    run(&store, args.command).await
}
