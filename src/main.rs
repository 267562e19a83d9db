use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use folio::config::Config;
use folio::db::{Database, PhotoFilter, SortOrder};
use folio::enrich::{self, EnrichOptions};
use folio::export::{self, ExportFormat};
use folio::naming;
use folio::scanner::Scanner;
use folio::taxonomy;
use folio::vision::VisionClient;
use folio::logging;

/// Sports photo catalog: import, AI enrichment, taxonomy and album naming.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Mirror log events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config (if missing) and create the database schema
    Init,

    /// Import a directory tree; every directory is an album
    Import {
        dir: PathBuf,
    },

    /// Run vision-model enrichment over photos that have none yet
    Enrich {
        /// Maximum number of photos to process
        #[arg(long)]
        limit: Option<usize>,

        /// Concurrent calls per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between batches in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// List candidates without calling the provider
        #[arg(long)]
        dry_run: bool,
    },

    /// Backfill sport_type from play types, keywords and album names
    Taxonomy {
        /// Re-derive rows that already have a sport
        #[arg(long)]
        force: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Album name canonicalization
    Albums {
        #[command(subcommand)]
        action: AlbumsAction,
    },

    /// List photos matching filters
    Explore(FilterArgs),

    /// Catalog totals
    Stats,

    /// Export photos matching filters as JSON or CSV
    Export {
        path: PathBuf,

        /// json or csv; guessed from the extension when omitted
        #[arg(long)]
        format: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Copy a SQLite catalog into PostgreSQL
    #[cfg(feature = "postgres")]
    Migrate {
        #[arg(long, env = "FOLIO_POSTGRES_URL")]
        postgres_url: String,

        /// SQLite file to read; defaults to the configured database
        #[arg(long)]
        sqlite_path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AlbumsAction {
    /// Propose canonical names and show their drift
    Plan {
        /// Also write the plan to a .json or .csv file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Apply proposals within the configured drift limit
    Apply {
        /// Apply every changed proposal regardless of drift
        #[arg(long)]
        force: bool,
    },

    /// Show the albums_summary aggregate
    Summary,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    #[arg(long)]
    album: Option<String>,

    #[arg(long)]
    sport: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    emotion: Option<String>,

    #[arg(long)]
    intensity: Option<String>,

    #[arg(long)]
    time_of_day: Option<String>,

    #[arg(long)]
    min_sharpness: Option<f64>,

    #[arg(long)]
    min_composition: Option<f64>,

    #[arg(long)]
    min_impact: Option<f64>,

    /// Substring match on keywords and album name
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    enriched_only: bool,

    /// newest, oldest, sharpest or most-emotional
    #[arg(long, default_value = "newest")]
    sort: String,

    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, default_value_t = 0)]
    offset: usize,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<PhotoFilter> {
        let Some(sort) = SortOrder::from_str(&self.sort) else {
            bail!("Unknown sort order: {}", self.sort);
        };
        Ok(PhotoFilter {
            album_key: self.album.clone(),
            sport_type: self.sport.clone(),
            photo_category: self.category.clone(),
            emotion: self.emotion.clone(),
            action_intensity: self.intensity.clone(),
            time_of_day: self.time_of_day.clone(),
            min_sharpness: self.min_sharpness,
            min_composition: self.min_composition,
            min_emotional_impact: self.min_impact,
            search: self.search.clone(),
            enriched_only: self.enriched_only,
            sort,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = Config::load_from(&config_path)?;

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(logging::default_log_dir()), cli.verbose);
    tracing::debug!(config = %config_path.display(), "Loaded configuration");

    run(cli.command, &config, &config_path)
}

fn open_database(config: &Config) -> Result<Database> {
    let db = Database::open(&config.database).context("Failed to open database")?;
    db.initialize()?;
    Ok(db)
}

fn run(command: Commands, config: &Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Init => {
            let db = open_database(config)?;
            println!("Config:   {}", config_path.display());
            println!("Database: {} ({})", describe_database(config), db.backend_name());
        }

        Commands::Import { dir } => {
            let db = open_database(config)?;
            let report = Scanner::new(&config.scanner).import_directory(&dir, &db)?;
            println!(
                "Imported {}: {} found, {} new, {} updated, {} failed across {} albums",
                dir.display(),
                report.found,
                report.new,
                report.updated,
                report.failed,
                report.albums
            );
        }

        Commands::Enrich {
            limit,
            batch_size,
            delay_ms,
            dry_run,
        } => {
            let db = open_database(config)?;
            let mut options = EnrichOptions::from_config(&config.enrichment);
            options.limit = limit.or(options.limit);
            if let Some(size) = batch_size {
                options.batch_size = size;
            }
            if let Some(ms) = delay_ms {
                options.batch_delay = std::time::Duration::from_millis(ms);
            }
            options.dry_run = dry_run;

            if dry_run {
                let (candidates, report) = enrich::preview_enrichment(&db, &options)?;
                for c in &candidates {
                    println!("{}  {}", c.image_key, c.album_name);
                }
                println!("{} photos would be enriched", report.candidates);
                return Ok(());
            }

            let client = VisionClient::from_config(&config.vision, config.enrichment.prompt_context.clone())?;
            let cancel = enrich::install_interrupt_handler()?;

            let report = enrich::run_enrichment(&db, &client, &options, &cancel)?;
            println!(
                "Enriched {}/{} photos ({} failed, {} skipped{}) for ${:.4} in {:.1}s",
                report.succeeded,
                report.candidates,
                report.failed,
                report.skipped,
                if report.cancelled { ", cancelled" } else { "" },
                report.total_cost,
                report.elapsed_secs
            );
        }

        Commands::Taxonomy { force, dry_run } => {
            let db = open_database(config)?;
            let report = taxonomy::backfill_sport_types(&db, &config.taxonomy, force, dry_run)?;
            println!(
                "{} photos considered, {} {}",
                report.considered,
                report.changed,
                if dry_run { "would change" } else { "changed" }
            );
            for (source, count) in &report.by_source {
                println!("  via {:<12} {}", source, count);
            }
            for (sport, count) in &report.by_sport {
                println!("  {:<16} {}", sport, count);
            }
        }

        Commands::Albums { action } => {
            let db = open_database(config)?;
            run_albums(action, &db, config)?;
        }

        Commands::Explore(args) => {
            let db = open_database(config)?;
            let filter = args.to_filter()?;
            let total = db.count_photos(&filter)?;
            let photos = db.query_photos(&filter)?;
            for p in &photos {
                println!(
                    "{}  {:<19}  {:<12}  {:>4}  {:<11}  {}",
                    p.image_key,
                    p.photo_date.as_deref().unwrap_or("-"),
                    p.sport_type.as_deref().unwrap_or("-"),
                    p.sharpness.map(|s| format!("{:.1}", s)).unwrap_or_else(|| "-".to_string()),
                    p.photo_category.as_deref().unwrap_or("-"),
                    p.album_name
                );
            }
            println!("{} of {} matching photos", photos.len(), total);
        }

        Commands::Stats => {
            let db = open_database(config)?;
            let stats = db.catalog_stats()?;
            println!("Photos:     {}", stats.total_photos);
            println!("Enriched:   {}", stats.enriched);
            println!("Unenriched: {}", stats.unenriched);
            println!("Albums:     {}", stats.albums);
            println!("AI cost:    ${:.4}", stats.total_ai_cost);
            if !stats.by_sport.is_empty() {
                println!("By sport:");
                for (sport, count) in &stats.by_sport {
                    println!("  {:<16} {}", sport, count);
                }
            }
            if !stats.by_provider.is_empty() {
                println!("By provider:");
                for (provider, count) in &stats.by_provider {
                    println!("  {:<16} {}", provider, count);
                }
            }
        }

        Commands::Export { path, format, filter } => {
            let db = open_database(config)?;
            let format = match format {
                Some(f) => ExportFormat::parse(&f)?,
                None => ExportFormat::from_path(&path),
            };
            let count = export::export_photos(&db, &filter.to_filter()?, &path, format)?;
            println!("Exported {} photos to {}", count, path.display());
        }

        #[cfg(feature = "postgres")]
        Commands::Migrate {
            postgres_url,
            sqlite_path,
        } => {
            let source = sqlite_path.unwrap_or_else(|| config.database.sqlite_path.clone());
            let rows = folio::db::migrate_sqlite_to_postgres(&source, &postgres_url)?;
            println!("Copied {} rows from {} to PostgreSQL", rows, source.display());
        }
    }

    Ok(())
}

fn run_albums(action: AlbumsAction, db: &Database, config: &Config) -> Result<()> {
    match action {
        AlbumsAction::Plan { export } => {
            let plan = naming::plan_album_renames(db, &config.naming)?;
            for p in &plan {
                if p.is_unchanged() {
                    continue;
                }
                println!(
                    "{:>3} {:<9} {}  \"{}\" -> \"{}\"",
                    p.drift,
                    p.band.as_str(),
                    p.album_key,
                    p.current_name,
                    p.proposed_name
                );
            }
            let unchanged = plan.iter().filter(|p| p.is_unchanged()).count();
            println!("{} albums, {} already canonical", plan.len(), unchanged);

            if let Some(path) = export {
                let count = export::export_rename_plan(&plan, &path, ExportFormat::from_path(&path))?;
                println!("Wrote {} proposals to {}", count, path.display());
            }
        }

        AlbumsAction::Apply { force } => {
            let plan = naming::plan_album_renames(db, &config.naming)?;
            let report = naming::apply_album_renames(db, &plan, &config.naming, force)?;
            println!(
                "Renamed {} albums ({} photos); {} unchanged, {} held back above drift {}",
                report.renamed,
                report.photos_updated,
                report.unchanged,
                report.held_back,
                config.naming.auto_apply_max_drift
            );
        }

        AlbumsAction::Summary => {
            for album in db.albums_summary()? {
                println!(
                    "{}  {:>5} photos  {:>5} enriched  {} .. {}  {:<12}  {}",
                    album.album_key,
                    album.photo_count,
                    album.enriched_count,
                    album.first_photo_date.as_deref().unwrap_or("-"),
                    album.last_photo_date.as_deref().unwrap_or("-"),
                    album.primary_sport.as_deref().unwrap_or("-"),
                    album.album_name
                );
            }
        }
    }
    Ok(())
}

fn describe_database(config: &Config) -> String {
    match config.database.backend {
        folio::config::DatabaseType::Sqlite => config.database.sqlite_path.display().to_string(),
        folio::config::DatabaseType::Postgresql => "PostgreSQL".to_string(),
    }
}
