mod schema;
pub mod albums;
pub mod photos;
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod postgres_schema;
#[cfg(feature = "postgres")]
pub mod migrate;

use anyhow::Result;

#[cfg(feature = "postgres")]
pub use migrate::migrate_sqlite_to_postgres;

pub use albums::{AlbumPhoto, AlbumPhotos, AlbumSummary, CatalogStats};
pub use photos::{
    Enrichment, EnrichmentCandidate, NewPhoto, PhotoFilter, PhotoRecord, SortOrder, TaxonomyRow,
    UpsertOutcome,
};

use crate::config::DatabaseConfig;
#[cfg(feature = "postgres")]
use crate::config::DatabaseType;

/// Dispatch a method call to the active backend variant.
macro_rules! dispatch {
    ($self:expr, $method:ident()) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method(),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method(),
        }
    };
    ($self:expr, $method:ident($($arg:expr),+ $(,)?)) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method($($arg),+),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method($($arg),+),
        }
    };
}

enum DatabaseInner {
    Sqlite(sqlite::SqliteDb),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgDb),
}

/// The photo catalog. All reads and writes of `photo_metadata` and
/// `albums_summary` go through here.
pub struct Database {
    inner: DatabaseInner,
}

impl Database {
    /// Open a database connection based on the provided configuration.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        #[cfg(feature = "postgres")]
        {
            if config.backend == DatabaseType::Postgresql {
                let url = config
                    .postgresql_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("PostgreSQL URL not configured"))?;
                let pool_size = config.pool_size.unwrap_or(10);
                let pg = postgres::PgDb::open(url, pool_size)?;
                return Ok(Self { inner: DatabaseInner::Postgres(pg) });
            }
        }

        let db = sqlite::SqliteDb::open(&config.sqlite_path)?;
        Ok(Self { inner: DatabaseInner::Sqlite(db) })
    }

    /// Open a SQLite catalog at an explicit path.
    pub fn open_sqlite(path: &std::path::Path) -> Result<Self> {
        let db = sqlite::SqliteDb::open(path)?;
        Ok(Self { inner: DatabaseInner::Sqlite(db) })
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.inner {
            DatabaseInner::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(_) => "postgresql",
        }
    }

    pub fn initialize(&self) -> Result<()> {
        dispatch!(self, initialize())
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    pub fn upsert_photo(&self, photo: &NewPhoto) -> Result<UpsertOutcome> {
        dispatch!(self, upsert_photo(photo))
    }

    pub fn photo_exists(&self, image_key: &str) -> Result<bool> {
        dispatch!(self, photo_exists(image_key))
    }

    pub fn get_photo(&self, image_key: &str) -> Result<Option<PhotoRecord>> {
        dispatch!(self, get_photo(image_key))
    }

    pub fn query_photos(&self, filter: &PhotoFilter) -> Result<Vec<PhotoRecord>> {
        dispatch!(self, query_photos(filter))
    }

    pub fn count_photos(&self, filter: &PhotoFilter) -> Result<i64> {
        dispatch!(self, count_photos(filter))
    }

    // ========================================================================
    // Enrichment operations
    // ========================================================================

    pub fn photos_needing_enrichment(&self, limit: Option<usize>) -> Result<Vec<EnrichmentCandidate>> {
        dispatch!(self, photos_needing_enrichment(limit))
    }

    pub fn save_enrichment(
        &self,
        image_key: &str,
        enrichment: &Enrichment,
        provider: &str,
        cost: Option<f64>,
    ) -> Result<()> {
        dispatch!(self, save_enrichment(image_key, enrichment, provider, cost))
    }

    // ========================================================================
    // Album operations
    // ========================================================================

    pub fn list_album_keys(&self) -> Result<Vec<String>> {
        dispatch!(self, list_album_keys())
    }

    pub fn get_album_name(&self, album_key: &str) -> Result<Option<String>> {
        dispatch!(self, get_album_name(album_key))
    }

    pub fn album_photos(&self, album_key: &str) -> Result<Option<AlbumPhotos>> {
        dispatch!(self, album_photos(album_key))
    }

    pub fn rename_album(&self, album_key: &str, new_name: &str) -> Result<usize> {
        dispatch!(self, rename_album(album_key, new_name))
    }

    pub fn refresh_albums_summary(&self) -> Result<()> {
        dispatch!(self, refresh_albums_summary())
    }

    pub fn albums_summary(&self) -> Result<Vec<AlbumSummary>> {
        dispatch!(self, albums_summary())
    }

    // ========================================================================
    // Taxonomy operations
    // ========================================================================

    pub fn photos_for_taxonomy(&self, force: bool) -> Result<Vec<TaxonomyRow>> {
        dispatch!(self, photos_for_taxonomy(force))
    }

    pub fn assign_sport_types(&self, assignments: &[(String, String)]) -> Result<usize> {
        dispatch!(self, assign_sport_types(assignments))
    }

    // ========================================================================
    // Stats
    // ========================================================================

    pub fn catalog_stats(&self) -> Result<CatalogStats> {
        dispatch!(self, catalog_stats())
    }
}
