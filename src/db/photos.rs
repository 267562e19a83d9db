//! Row types and the explore-query filter for `photo_metadata`.

use serde::Serialize;

/// A full `photo_metadata` row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhotoRecord {
    pub image_key: String,
    pub album_key: String,
    pub album_name: String,
    pub filename: String,
    pub local_path: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub original_url: Option<String>,
    pub photo_date: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub sharpness: Option<f64>,
    pub composition_score: Option<f64>,
    pub emotional_impact: Option<f64>,
    pub sport_type: Option<String>,
    pub photo_category: Option<String>,
    pub emotion: Option<String>,
    pub action_intensity: Option<String>,
    pub time_of_day: Option<String>,
    pub play_type: Option<String>,
    pub keywords: Vec<String>,
    pub team_names: Vec<String>,
    pub event_name: Option<String>,
    pub ai_provider: Option<String>,
    pub ai_cost: Option<f64>,
    pub enriched_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Column list matching [`PhotoRecord`] field order, shared by both backends.
pub const PHOTO_COLUMNS: &str = "image_key, album_key, album_name, filename, \
    local_path, image_url, thumbnail_url, original_url, \
    photo_date, width, height, \
    sharpness, composition_score, emotional_impact, \
    sport_type, photo_category, emotion, action_intensity, time_of_day, play_type, \
    keywords, team_names, event_name, \
    ai_provider, ai_cost, enriched_at, created_at, updated_at";

/// Source columns written by import. Enrichment columns are left alone.
#[derive(Debug, Clone, Default)]
pub struct NewPhoto {
    pub image_key: String,
    pub album_key: String,
    pub album_name: String,
    pub filename: String,
    pub local_path: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub original_url: Option<String>,
    pub photo_date: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Whether an upsert created a row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Validated metadata returned by a vision provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Enrichment {
    pub sharpness: Option<f64>,
    pub composition_score: Option<f64>,
    pub emotional_impact: Option<f64>,
    pub sport_type: Option<String>,
    pub photo_category: Option<String>,
    pub emotion: Option<String>,
    pub action_intensity: Option<String>,
    pub time_of_day: Option<String>,
    pub play_type: Option<String>,
    pub keywords: Vec<String>,
    pub team_names: Vec<String>,
    pub event_name: Option<String>,
}

/// A photo awaiting enrichment and where to load its pixels from.
#[derive(Debug, Clone)]
pub struct EnrichmentCandidate {
    pub image_key: String,
    pub local_path: Option<String>,
    pub image_url: Option<String>,
    pub album_name: String,
}

/// Fields the sport-taxonomy rules look at.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyRow {
    pub image_key: String,
    pub album_name: String,
    pub play_type: Option<String>,
    pub keywords: Vec<String>,
    pub sport_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Sharpest,
    MostEmotional,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "newest" | "recent" => Some(SortOrder::Newest),
            "oldest" => Some(SortOrder::Oldest),
            "sharpest" | "quality" => Some(SortOrder::Sharpest),
            "emotional" | "most_emotional" | "most-emotional" | "emotion" => Some(SortOrder::MostEmotional),
            _ => None,
        }
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            SortOrder::Newest => "photo_date DESC NULLS LAST, image_key ASC",
            SortOrder::Oldest => "photo_date ASC NULLS LAST, image_key ASC",
            SortOrder::Sharpest => "sharpness DESC NULLS LAST, photo_date DESC NULLS LAST, image_key ASC",
            SortOrder::MostEmotional => {
                "emotional_impact DESC NULLS LAST, photo_date DESC NULLS LAST, image_key ASC"
            }
        }
    }
}

/// Explore-page filters. Unset fields don't constrain the query.
#[derive(Debug, Clone, Default)]
pub struct PhotoFilter {
    pub album_key: Option<String>,
    pub sport_type: Option<String>,
    pub photo_category: Option<String>,
    pub emotion: Option<String>,
    pub action_intensity: Option<String>,
    pub time_of_day: Option<String>,
    pub min_sharpness: Option<f64>,
    pub min_composition: Option<f64>,
    pub min_emotional_impact: Option<f64>,
    /// Case-insensitive match against album name and keywords.
    pub search: Option<String>,
    pub enriched_only: bool,
    pub sort: SortOrder,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// A bound parameter produced by [`PhotoFilter::where_clause`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Real(f64),
}

impl PhotoFilter {
    /// Build a `WHERE` clause (empty when unfiltered) and its parameters.
    /// `placeholder(n)` renders the n-th (1-based) bind marker for the backend.
    pub fn where_clause(&self, placeholder: impl Fn(usize) -> String) -> (String, Vec<FilterValue>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<FilterValue> = Vec::new();

        let mut push = |template: &str, value: FilterValue, params: &mut Vec<FilterValue>| {
            params.push(value);
            clauses.push(template.replace("{}", &placeholder(params.len())));
        };

        if let Some(ref key) = self.album_key {
            push("album_key = {}", FilterValue::Text(key.clone()), &mut params);
        }

        let tags = [
            ("sport_type = {}", &self.sport_type),
            ("photo_category = {}", &self.photo_category),
            ("emotion = {}", &self.emotion),
            ("action_intensity = {}", &self.action_intensity),
            ("time_of_day = {}", &self.time_of_day),
        ];
        for (template, value) in tags {
            if let Some(v) = value {
                push(template, FilterValue::Text(v.trim().to_lowercase()), &mut params);
            }
        }

        let minimums = [
            ("sharpness >= {}", self.min_sharpness),
            ("composition_score >= {}", self.min_composition),
            ("emotional_impact >= {}", self.min_emotional_impact),
        ];
        for (template, value) in minimums {
            if let Some(v) = value {
                push(template, FilterValue::Real(v), &mut params);
            }
        }

        if let Some(ref search) = self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                let pattern = format!("%{}%", needle);
                params.push(FilterValue::Text(pattern.clone()));
                let first = placeholder(params.len());
                params.push(FilterValue::Text(pattern));
                let second = placeholder(params.len());
                clauses.push(format!(
                    "(LOWER(album_name) LIKE {} OR LOWER(COALESCE(keywords, '')) LIKE {})",
                    first, second
                ));
            }
        }

        if self.enriched_only {
            clauses.push("enriched_at IS NOT NULL".to_string());
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }

    /// `LIMIT/OFFSET` suffix in syntax both backends accept.
    pub fn paging_clause(&self) -> String {
        match self.limit {
            Some(limit) => format!("LIMIT {} OFFSET {}", limit, self.offset),
            None if self.offset > 0 => format!("LIMIT {} OFFSET {}", i64::MAX, self.offset),
            None => String::new(),
        }
    }
}

/// Parse a JSON array column, tolerating NULL and malformed values.
pub fn parse_string_array(value: Option<String>) -> Vec<String> {
    value
        .and_then(|json| serde_json::from_str::<Vec<String>>(&json).ok())
        .unwrap_or_default()
}

/// Serialize a string array column; empty arrays are stored as NULL.
pub fn encode_string_array(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        serde_json::to_string(values).ok()
    }
}
