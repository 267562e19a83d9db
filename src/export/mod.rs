use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::db::{Database, PhotoFilter, PhotoRecord};
use crate::naming::NameProposal;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => bail!("Unknown export format: {} (expected json or csv)", other),
        }
    }

    /// Guess from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()) {
            Some(ext) if ext == "csv" => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

/// Export the photos matching `filter` to a file. Returns the row count.
pub fn export_photos(db: &Database, filter: &PhotoFilter, output_path: &Path, format: ExportFormat) -> Result<usize> {
    let photos = db.query_photos(filter)?;
    let count = photos.len();

    match format {
        ExportFormat::Json => write_json(&photos, output_path)?,
        ExportFormat::Csv => export_photos_csv(&photos, output_path)?,
    }

    Ok(count)
}

/// Export an album rename plan for review.
pub fn export_rename_plan(proposals: &[NameProposal], output_path: &Path, format: ExportFormat) -> Result<usize> {
    match format {
        ExportFormat::Json => write_json(proposals, output_path)?,
        ExportFormat::Csv => export_plan_csv(proposals, output_path)?,
    }
    Ok(proposals.len())
}

fn write_json<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn export_photos_csv(photos: &[PhotoRecord], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    wtr.write_record([
        "image_key",
        "album_key",
        "album_name",
        "filename",
        "local_path",
        "image_url",
        "photo_date",
        "width",
        "height",
        "sharpness",
        "composition_score",
        "emotional_impact",
        "sport_type",
        "photo_category",
        "emotion",
        "action_intensity",
        "time_of_day",
        "play_type",
        "keywords",
        "team_names",
        "event_name",
        "ai_provider",
        "ai_cost",
        "enriched_at",
    ])?;

    for photo in photos {
        wtr.write_record([
            photo.image_key.clone(),
            photo.album_key.clone(),
            photo.album_name.clone(),
            photo.filename.clone(),
            opt(&photo.local_path),
            opt(&photo.image_url),
            opt(&photo.photo_date),
            opt(&photo.width),
            opt(&photo.height),
            opt(&photo.sharpness),
            opt(&photo.composition_score),
            opt(&photo.emotional_impact),
            opt(&photo.sport_type),
            opt(&photo.photo_category),
            opt(&photo.emotion),
            opt(&photo.action_intensity),
            opt(&photo.time_of_day),
            opt(&photo.play_type),
            photo.keywords.join(";"),
            photo.team_names.join(";"),
            opt(&photo.event_name),
            opt(&photo.ai_provider),
            opt(&photo.ai_cost),
            opt(&photo.enriched_at),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn export_plan_csv(proposals: &[NameProposal], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    wtr.write_record(["album_key", "current_name", "proposed_name", "drift", "band", "label_source", "date"])?;

    for p in proposals {
        wtr.write_record([
            p.album_key.clone(),
            p.current_name.clone(),
            p.proposed_name.clone(),
            p.drift.to_string(),
            p.band.as_str().to_string(),
            p.label_source.as_str().to_string(),
            opt(&p.date),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_photo, temp_database};
    use crate::db::Enrichment;
    use crate::naming::{DriftBand, LabelSource};
    use tempfile::tempdir;

    #[test]
    fn test_format_detection() {
        assert_eq!(ExportFormat::from_path(Path::new("out.CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Json);
        assert_eq!(ExportFormat::parse("Csv").unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::parse("html").is_err());
    }

    #[test]
    fn test_export_photos_json_and_csv() {
        let (_dir, db) = temp_database();
        insert_photo(&db, "k1", "alb", "Finals", Some("2024-10-05 10:00:00"));
        insert_photo(&db, "k2", "alb", "Finals", Some("2024-10-05 11:00:00"));
        db.save_enrichment(
            "k1",
            &Enrichment {
                sport_type: Some("volleyball".to_string()),
                keywords: vec!["net".to_string(), "spike".to_string()],
                ..Default::default()
            },
            "anthropic",
            Some(0.01),
        )
        .unwrap();

        let out = tempdir().unwrap();
        let filter = PhotoFilter {
            sport_type: Some("volleyball".to_string()),
            ..Default::default()
        };

        let json_path = out.path().join("photos.json");
        assert_eq!(export_photos(&db, &filter, &json_path, ExportFormat::Json).unwrap(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed[0]["image_key"], "k1");
        assert_eq!(parsed[0]["keywords"][1], "spike");

        let csv_path = out.path().join("photos.csv");
        assert_eq!(export_photos(&db, &PhotoFilter::default(), &csv_path, ExportFormat::Csv).unwrap(), 2);
        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let keywords_col = headers.iter().position(|h| h == "keywords").unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| &r[keywords_col] == "net;spike"));
    }

    #[test]
    fn test_export_rename_plan_csv() {
        let proposals = vec![NameProposal {
            album_key: "alb".to_string(),
            current_name: "DSC dump".to_string(),
            proposed_name: "Eagles vs Hawks - Sep 14, 2024".to_string(),
            label: "Eagles vs Hawks".to_string(),
            label_source: LabelSource::Matchup,
            date: Some("Sep 14, 2024".to_string()),
            drift: 80,
            band: DriftBand::Major,
        }];

        let out = tempdir().unwrap();
        let path = out.path().join("plan.csv");
        assert_eq!(export_rename_plan(&proposals, &path, ExportFormat::Csv).unwrap(), 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[2], "Eagles vs Hawks - Sep 14, 2024");
        assert_eq!(&row[3], "80");
        assert_eq!(&row[4], "major");
        assert_eq!(&row[5], "matchup");

        let json_path = out.path().join("plan.json");
        export_rename_plan(&proposals, &json_path, ExportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed[0]["band"], "major");
        assert_eq!(parsed[0]["label_source"], "matchup");
    }
}
