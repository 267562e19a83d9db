//! Sport-type inference for photos the vision pass left unlabeled.
//!
//! Rules run in a fixed order and the first hit wins: play type, keywords,
//! album name, configured default.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::config::TaxonomyConfig;
use crate::db::{Database, TaxonomyRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SportType {
    Volleyball,
    Basketball,
    Football,
    Soccer,
    Baseball,
    Softball,
    Wrestling,
    Track,
    CrossCountry,
    Swimming,
    Lacrosse,
    Tennis,
    Golf,
    Hockey,
    Rugby,
    Cheer,
    Other,
}

impl SportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SportType::Volleyball => "volleyball",
            SportType::Basketball => "basketball",
            SportType::Football => "football",
            SportType::Soccer => "soccer",
            SportType::Baseball => "baseball",
            SportType::Softball => "softball",
            SportType::Wrestling => "wrestling",
            SportType::Track => "track",
            SportType::CrossCountry => "cross_country",
            SportType::Swimming => "swimming",
            SportType::Lacrosse => "lacrosse",
            SportType::Tennis => "tennis",
            SportType::Golf => "golf",
            SportType::Hockey => "hockey",
            SportType::Rugby => "rugby",
            SportType::Cheer => "cheer",
            SportType::Other => "other",
        }
    }

    /// Canonical sport for a free-form name: `"Volley Ball"`, `"vball"`,
    /// `"track & field"`, `"cross_country"`.
    pub fn from_alias(value: &str) -> Option<Self> {
        let key = normalize(value);
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, sport)| *sport)
    }
}

impl fmt::Display for SportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical text of a sport value, or `None` when it is not a sport this
/// catalog knows.
pub fn normalize_sport(value: &str) -> Option<String> {
    SportType::from_alias(value).map(|s| s.as_str().to_string())
}

// Longer aliases first so "swim & dive" wins over "dive" in containment checks.
const ALIASES: &[(&str, SportType)] = &[
    ("track and field", SportType::Track),
    ("track & field", SportType::Track),
    ("cross country", SportType::CrossCountry),
    ("swim and dive", SportType::Swimming),
    ("swim & dive", SportType::Swimming),
    ("volley ball", SportType::Volleyball),
    ("basket ball", SportType::Basketball),
    ("foot ball", SportType::Football),
    ("ice hockey", SportType::Hockey),
    ("volleyball", SportType::Volleyball),
    ("basketball", SportType::Basketball),
    ("cheerleading", SportType::Cheer),
    ("football", SportType::Football),
    ("gridiron", SportType::Football),
    ("soccer", SportType::Soccer),
    ("futbol", SportType::Soccer),
    ("baseball", SportType::Baseball),
    ("softball", SportType::Softball),
    ("wrestling", SportType::Wrestling),
    ("track", SportType::Track),
    ("swimming", SportType::Swimming),
    ("swim", SportType::Swimming),
    ("diving", SportType::Swimming),
    ("lacrosse", SportType::Lacrosse),
    ("tennis", SportType::Tennis),
    ("golf", SportType::Golf),
    ("hockey", SportType::Hockey),
    ("rugby", SportType::Rugby),
    ("cheer", SportType::Cheer),
    ("vball", SportType::Volleyball),
    ("hoops", SportType::Basketball),
    ("bball", SportType::Basketball),
    ("xc", SportType::CrossCountry),
    ("lax", SportType::Lacrosse),
    ("other", SportType::Other),
];

/// Plays and techniques that only happen in one sport.
const PLAY_TERMS: &[(&str, SportType)] = &[
    ("spike", SportType::Volleyball),
    ("block", SportType::Volleyball),
    ("dig", SportType::Volleyball),
    ("kill", SportType::Volleyball),
    ("dunk", SportType::Basketball),
    ("layup", SportType::Basketball),
    ("lay up", SportType::Basketball),
    ("free throw", SportType::Basketball),
    ("jump shot", SportType::Basketball),
    ("rebound", SportType::Basketball),
    ("touchdown", SportType::Football),
    ("tackle", SportType::Football),
    ("sack", SportType::Football),
    ("field goal", SportType::Football),
    ("punt", SportType::Football),
    ("kickoff", SportType::Football),
    ("corner kick", SportType::Soccer),
    ("header", SportType::Soccer),
    ("penalty kick", SportType::Soccer),
    ("goal kick", SportType::Soccer),
    ("bicycle kick", SportType::Soccer),
    ("pitch", SportType::Baseball),
    ("home run", SportType::Baseball),
    ("strikeout", SportType::Baseball),
    ("bunt", SportType::Baseball),
    ("stolen base", SportType::Baseball),
    ("takedown", SportType::Wrestling),
    ("pin", SportType::Wrestling),
    ("reversal", SportType::Wrestling),
    ("hurdle", SportType::Track),
    ("relay", SportType::Track),
    ("long jump", SportType::Track),
    ("high jump", SportType::Track),
    ("pole vault", SportType::Track),
    ("shot put", SportType::Track),
    ("butterfly", SportType::Swimming),
    ("freestyle", SportType::Swimming),
    ("backstroke", SportType::Swimming),
    ("breaststroke", SportType::Swimming),
    ("slap shot", SportType::Hockey),
    ("scrum", SportType::Rugby),
];

fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn play_term(value: &str) -> Option<SportType> {
    let key = normalize(value);
    // "spikes", "tackles"
    let singular = key.strip_suffix('s').unwrap_or(&key);
    PLAY_TERMS
        .iter()
        .find(|(term, _)| *term == key || *term == singular)
        .map(|(_, sport)| *sport)
}

/// First alias appearing as whole words inside `text`.
fn contained_alias(text: &str) -> Option<SportType> {
    let padded = format!(" {} ", normalize(text));
    ALIASES
        .iter()
        .filter(|(_, sport)| *sport != SportType::Other)
        .find(|(alias, _)| padded.contains(&format!(" {} ", alias)))
        .map(|(_, sport)| *sport)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    PlayType,
    Keyword,
    AlbumName,
    Default,
}

impl RuleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSource::PlayType => "play_type",
            RuleSource::Keyword => "keyword",
            RuleSource::AlbumName => "album_name",
            RuleSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inference {
    pub sport: SportType,
    pub source: RuleSource,
}

pub fn infer_sport(row: &TaxonomyRow, default: SportType) -> Inference {
    if let Some(sport) = row.play_type.as_deref().and_then(play_term) {
        return Inference { sport, source: RuleSource::PlayType };
    }

    let keyword_hit = row.keywords.iter().find_map(|kw| {
        SportType::from_alias(kw)
            .filter(|s| *s != SportType::Other)
            .or_else(|| play_term(kw))
            .or_else(|| contained_alias(kw))
    });
    if let Some(sport) = keyword_hit {
        return Inference { sport, source: RuleSource::Keyword };
    }

    if let Some(sport) = contained_alias(&row.album_name) {
        return Inference { sport, source: RuleSource::AlbumName };
    }

    Inference { sport: default, source: RuleSource::Default }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillReport {
    pub considered: usize,
    pub changed: usize,
    pub dry_run: bool,
    pub by_source: BTreeMap<String, usize>,
    pub by_sport: BTreeMap<String, usize>,
}

/// Fill `sport_type` for rows that lack it, or for every row with `force`.
/// Running it twice without `force` changes nothing the second time.
pub fn backfill_sport_types(
    db: &Database,
    config: &TaxonomyConfig,
    force: bool,
    dry_run: bool,
) -> Result<BackfillReport> {
    let default = SportType::from_alias(&config.default_sport).unwrap_or_else(|| {
        warn!(default_sport = %config.default_sport, "Unknown default sport, using other");
        SportType::Other
    });

    let rows = db.photos_for_taxonomy(force)?;
    let mut report = BackfillReport {
        considered: rows.len(),
        dry_run,
        ..Default::default()
    };

    let mut assignments = Vec::new();
    for row in &rows {
        let inference = infer_sport(row, default);
        *report.by_source.entry(inference.source.as_str().to_string()).or_default() += 1;
        *report.by_sport.entry(inference.sport.as_str().to_string()).or_default() += 1;

        if row.sport_type.as_deref() != Some(inference.sport.as_str()) {
            assignments.push((row.image_key.clone(), inference.sport.as_str().to_string()));
        }
    }

    report.changed = if dry_run {
        assignments.len()
    } else {
        let changed = db.assign_sport_types(&assignments)?;
        if changed > 0 {
            db.refresh_albums_summary()?;
        }
        changed
    };

    info!(
        considered = report.considered,
        changed = report.changed,
        dry_run,
        "Sport taxonomy backfill"
    );
    Ok(report)
}
