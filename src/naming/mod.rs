//! Canonical album names.
//!
//! A proposal is `"{label} - {date span}"`, at most `max_length` chars,
//! plus a drift score saying how far it moved from the current name.
//! Proposing is pure; planning and applying read and write the catalog.

pub mod dates;
pub mod drift;
pub mod label;

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::NamingConfig;
use crate::db::{AlbumPhotos, Database};

pub use dates::DateSpan;
pub use drift::{drift_score, DriftBand};
pub use label::LabelSource;

/// Everything the name of one album is derived from.
#[derive(Debug, Clone, Default)]
pub struct AlbumNamingInput {
    pub album_key: String,
    pub current_name: String,
    pub photo_dates: Vec<String>,
    /// One entry per mention, so repetition carries weight.
    pub team_names: Vec<String>,
    pub event_names: Vec<String>,
    pub sport_type: Option<String>,
}

impl AlbumNamingInput {
    pub fn from_album(album: &AlbumPhotos) -> Self {
        let mut sports: HashMap<&str, usize> = HashMap::new();
        for sport in album.photos.iter().filter_map(|p| p.sport_type.as_deref()) {
            *sports.entry(sport).or_default() += 1;
        }
        let sport_type = sports
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
            .map(|(sport, _)| sport.to_string());

        Self {
            album_key: album.album_key.clone(),
            current_name: album.album_name.clone(),
            photo_dates: album.photos.iter().filter_map(|p| p.photo_date.clone()).collect(),
            team_names: album.photos.iter().flat_map(|p| p.team_names.iter().cloned()).collect(),
            event_names: album.photos.iter().filter_map(|p| p.event_name.clone()).collect(),
            sport_type,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NamingSettings {
    pub max_length: usize,
    pub min_day_share: f64,
}

impl From<&NamingConfig> for NamingSettings {
    fn from(config: &NamingConfig) -> Self {
        Self {
            max_length: config.max_length,
            min_day_share: config.min_day_share,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NameProposal {
    pub album_key: String,
    pub current_name: String,
    pub proposed_name: String,
    pub label: String,
    pub label_source: LabelSource,
    pub date: Option<String>,
    pub drift: u8,
    pub band: DriftBand,
}

impl NameProposal {
    /// Same name up to case and whitespace, i.e. drift 0. Never written.
    pub fn is_unchanged(&self) -> bool {
        drift::same_name(&self.current_name, &self.proposed_name)
    }
}

pub fn propose_name(input: &AlbumNamingInput, settings: &NamingSettings) -> NameProposal {
    let span = dates::span_from_photo_dates(&input.photo_dates, settings.min_day_share)
        .or_else(|| dates::span_from_name(&input.current_name));
    let date = span.map(|s| s.format());

    let (label, label_source) = label::choose_label(
        &input.current_name,
        &input.team_names,
        &input.event_names,
        input.sport_type.as_deref(),
    );

    let proposed_name = label::shorten(&label, date.as_deref(), settings.max_length);
    let drift = drift_score(&input.current_name, &proposed_name);

    NameProposal {
        album_key: input.album_key.clone(),
        current_name: input.current_name.clone(),
        proposed_name,
        label,
        label_source,
        date,
        drift,
        band: DriftBand::from_score(drift),
    }
}

/// Proposals for every album, highest drift first.
pub fn plan_album_renames(db: &Database, config: &NamingConfig) -> Result<Vec<NameProposal>> {
    let settings = NamingSettings::from(config);

    let mut inputs = Vec::new();
    for album_key in db.list_album_keys()? {
        if let Some(album) = db.album_photos(&album_key)? {
            inputs.push(AlbumNamingInput::from_album(&album));
        }
    }

    let mut proposals: Vec<NameProposal> =
        inputs.par_iter().map(|input| propose_name(input, &settings)).collect();

    proposals.sort_by(|a, b| b.drift.cmp(&a.drift).then_with(|| a.album_key.cmp(&b.album_key)));

    info!(albums = proposals.len(), "Planned album renames");
    Ok(proposals)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub renamed: usize,
    pub photos_updated: usize,
    pub unchanged: usize,
    pub held_back: usize,
}

/// Write proposals whose drift is within `auto_apply_max_drift`, or every
/// changed proposal when `force` is set.
pub fn apply_album_renames(
    db: &Database,
    proposals: &[NameProposal],
    config: &NamingConfig,
    force: bool,
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for proposal in proposals {
        if proposal.is_unchanged() {
            report.unchanged += 1;
            continue;
        }
        if !force && proposal.drift > config.auto_apply_max_drift {
            debug!(
                album_key = %proposal.album_key,
                drift = proposal.drift,
                "Rename held back for review"
            );
            report.held_back += 1;
            continue;
        }

        let rows = db.rename_album(&proposal.album_key, &proposal.proposed_name)?;
        if rows == 0 {
            warn!(album_key = %proposal.album_key, "Album vanished before rename");
            continue;
        }
        info!(
            album_key = %proposal.album_key,
            from = %proposal.current_name,
            to = %proposal.proposed_name,
            drift = proposal.drift,
            "Renamed album"
        );
        report.renamed += 1;
        report.photos_updated += rows;
    }

    if report.renamed > 0 {
        db.refresh_albums_summary()?;
    }
    Ok(report)
}
