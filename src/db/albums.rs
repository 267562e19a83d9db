//! Album-level types: the `albums_summary` aggregate and naming inputs.

use serde::Serialize;

/// One row of `albums_summary`.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumSummary {
    pub album_key: String,
    pub album_name: String,
    pub photo_count: i64,
    pub enriched_count: i64,
    pub first_photo_date: Option<String>,
    pub last_photo_date: Option<String>,
    pub primary_sport: Option<String>,
    pub avg_sharpness: Option<f64>,
}

/// The per-photo fields album-name canonicalization needs.
#[derive(Debug, Clone, Default)]
pub struct AlbumPhoto {
    pub photo_date: Option<String>,
    pub team_names: Vec<String>,
    pub event_name: Option<String>,
    pub sport_type: Option<String>,
}

/// An album's key, current name and photos.
#[derive(Debug, Clone, Default)]
pub struct AlbumPhotos {
    pub album_key: String,
    pub album_name: String,
    pub photos: Vec<AlbumPhoto>,
}

/// Whole-catalog counters for `folio stats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogStats {
    pub total_photos: i64,
    pub enriched: i64,
    pub unenriched: i64,
    pub albums: i64,
    pub total_ai_cost: f64,
    pub by_sport: Vec<(String, i64)>,
    pub by_provider: Vec<(String, i64)>,
}
