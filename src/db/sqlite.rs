//! SQLite backend implementation.

use anyhow::{Context, Result};
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, OptionalExtension, ToSql};
use std::path::Path;

use super::albums::{AlbumPhoto, AlbumPhotos, AlbumSummary, CatalogStats};
use super::photos::{
    encode_string_array, parse_string_array, Enrichment, EnrichmentCandidate, FilterValue,
    NewPhoto, PhotoFilter, PhotoRecord, TaxonomyRow, UpsertOutcome, PHOTO_COLUMNS,
};
use super::schema::{REFRESH_ALBUMS_SUMMARY, SCHEMA};

pub struct SqliteDb {
    pub(crate) conn: Connection,
}

impl ToSql for FilterValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FilterValue::Text(s) => s.to_sql(),
            FilterValue::Real(v) => v.to_sql(),
        }
    }
}

fn sqlite_placeholder(_: usize) -> String {
    "?".to_string()
}

fn row_to_photo(row: &rusqlite::Row) -> rusqlite::Result<PhotoRecord> {
    Ok(PhotoRecord {
        image_key: row.get(0)?,
        album_key: row.get(1)?,
        album_name: row.get(2)?,
        filename: row.get(3)?,
        local_path: row.get(4)?,
        image_url: row.get(5)?,
        thumbnail_url: row.get(6)?,
        original_url: row.get(7)?,
        photo_date: row.get(8)?,
        width: row.get(9)?,
        height: row.get(10)?,
        sharpness: row.get(11)?,
        composition_score: row.get(12)?,
        emotional_impact: row.get(13)?,
        sport_type: row.get(14)?,
        photo_category: row.get(15)?,
        emotion: row.get(16)?,
        action_intensity: row.get(17)?,
        time_of_day: row.get(18)?,
        play_type: row.get(19)?,
        keywords: parse_string_array(row.get(20)?),
        team_names: parse_string_array(row.get(21)?),
        event_name: row.get(22)?,
        ai_provider: row.get(23)?,
        ai_cost: row.get(24)?,
        enriched_at: row.get(25)?,
        created_at: row.get(26)?,
        updated_at: row.get(27)?,
    })
}

impl SqliteDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    pub fn upsert_photo(&self, photo: &NewPhoto) -> Result<UpsertOutcome> {
        let existed = self.photo_exists(&photo.image_key)?;
        self.conn.execute(
            r#"
            INSERT INTO photo_metadata (
                image_key, album_key, album_name, filename,
                local_path, image_url, thumbnail_url, original_url,
                photo_date, width, height
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(image_key) DO UPDATE SET
                album_name = CASE WHEN photo_metadata.album_key = excluded.album_key
                    THEN photo_metadata.album_name ELSE excluded.album_name END,
                album_key = excluded.album_key,
                filename = excluded.filename,
                local_path = COALESCE(excluded.local_path, photo_metadata.local_path),
                image_url = COALESCE(excluded.image_url, photo_metadata.image_url),
                thumbnail_url = COALESCE(excluded.thumbnail_url, photo_metadata.thumbnail_url),
                original_url = COALESCE(excluded.original_url, photo_metadata.original_url),
                photo_date = COALESCE(excluded.photo_date, photo_metadata.photo_date),
                width = COALESCE(excluded.width, photo_metadata.width),
                height = COALESCE(excluded.height, photo_metadata.height),
                updated_at = CURRENT_TIMESTAMP
            "#,
            rusqlite::params![
                photo.image_key,
                photo.album_key,
                photo.album_name,
                photo.filename,
                photo.local_path,
                photo.image_url,
                photo.thumbnail_url,
                photo.original_url,
                photo.photo_date,
                photo.width,
                photo.height,
            ],
        )?;
        Ok(if existed { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
    }

    pub fn photo_exists(&self, image_key: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM photo_metadata WHERE image_key = ?",
                [image_key],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_photo(&self, image_key: &str) -> Result<Option<PhotoRecord>> {
        let sql = format!("SELECT {} FROM photo_metadata WHERE image_key = ?", PHOTO_COLUMNS);
        let photo = self
            .conn
            .query_row(&sql, [image_key], row_to_photo)
            .optional()?;
        Ok(photo)
    }

    pub fn query_photos(&self, filter: &PhotoFilter) -> Result<Vec<PhotoRecord>> {
        let (where_clause, params) = filter.where_clause(sqlite_placeholder);
        let sql = format!(
            "SELECT {} FROM photo_metadata {} ORDER BY {} {}",
            PHOTO_COLUMNS,
            where_clause,
            filter.sort.order_by(),
            filter.paging_clause()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_photo)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    pub fn count_photos(&self, filter: &PhotoFilter) -> Result<i64> {
        let (where_clause, params) = filter.where_clause(sqlite_placeholder);
        let sql = format!("SELECT COUNT(*) FROM photo_metadata {}", where_clause);
        let count = self.conn.query_row(
            &sql,
            rusqlite::params_from_iter(params.iter()),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ========================================================================
    // Enrichment operations
    // ========================================================================

    pub fn photos_needing_enrichment(&self, limit: Option<usize>) -> Result<Vec<EnrichmentCandidate>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            r#"
            SELECT image_key, local_path, image_url, album_name
            FROM photo_metadata
            WHERE enriched_at IS NULL
              AND (local_path IS NOT NULL OR image_url IS NOT NULL)
            ORDER BY photo_date DESC NULLS LAST, image_key ASC
            LIMIT ?
            "#,
        )?;
        let candidates = stmt
            .query_map([limit], |row| {
                Ok(EnrichmentCandidate {
                    image_key: row.get(0)?,
                    local_path: row.get(1)?,
                    image_url: row.get(2)?,
                    album_name: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(candidates)
    }

    pub fn save_enrichment(
        &self,
        image_key: &str,
        enrichment: &Enrichment,
        provider: &str,
        cost: Option<f64>,
    ) -> Result<()> {
        let updated = self.conn.execute(
            r#"
            UPDATE photo_metadata
            SET sharpness = ?,
                composition_score = ?,
                emotional_impact = ?,
                sport_type = COALESCE(?, sport_type),
                photo_category = ?,
                emotion = ?,
                action_intensity = ?,
                time_of_day = ?,
                play_type = ?,
                keywords = ?,
                team_names = ?,
                event_name = ?,
                ai_provider = ?,
                ai_cost = ?,
                enriched_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE image_key = ?
            "#,
            rusqlite::params![
                enrichment.sharpness,
                enrichment.composition_score,
                enrichment.emotional_impact,
                enrichment.sport_type,
                enrichment.photo_category,
                enrichment.emotion,
                enrichment.action_intensity,
                enrichment.time_of_day,
                enrichment.play_type,
                encode_string_array(&enrichment.keywords),
                encode_string_array(&enrichment.team_names),
                enrichment.event_name,
                provider,
                cost,
                image_key,
            ],
        )?;
        if updated == 0 {
            anyhow::bail!("No photo with image_key {}", image_key);
        }
        Ok(())
    }

    // ========================================================================
    // Album operations
    // ========================================================================

    pub fn list_album_keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT album_key FROM photo_metadata ORDER BY album_key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    pub fn get_album_name(&self, album_key: &str) -> Result<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT album_name FROM photo_metadata WHERE album_key = ? LIMIT 1",
                [album_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    pub fn album_photos(&self, album_key: &str) -> Result<Option<AlbumPhotos>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT album_name, photo_date, team_names, event_name, sport_type
            FROM photo_metadata
            WHERE album_key = ?
            ORDER BY photo_date ASC NULLS LAST, image_key ASC
            "#,
        )?;
        let rows = stmt
            .query_map([album_key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    AlbumPhoto {
                        photo_date: row.get(1)?,
                        team_names: parse_string_array(row.get(2)?),
                        event_name: row.get(3)?,
                        sport_type: row.get(4)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let Some((album_name, _)) = rows.first() else {
            return Ok(None);
        };
        let album_name = album_name.clone();

        Ok(Some(AlbumPhotos {
            album_key: album_key.to_string(),
            album_name,
            photos: rows.into_iter().map(|(_, photo)| photo).collect(),
        }))
    }

    pub fn rename_album(&self, album_key: &str, new_name: &str) -> Result<usize> {
        let updated = self.conn.execute(
            r#"
            UPDATE photo_metadata
            SET album_name = ?, updated_at = CURRENT_TIMESTAMP
            WHERE album_key = ?
            "#,
            rusqlite::params![new_name, album_key],
        )?;
        Ok(updated)
    }

    pub fn refresh_albums_summary(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(REFRESH_ALBUMS_SUMMARY)?;
        tx.commit()?;
        Ok(())
    }

    pub fn albums_summary(&self) -> Result<Vec<AlbumSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT album_key, album_name, photo_count, enriched_count,
                   first_photo_date, last_photo_date, primary_sport, avg_sharpness
            FROM albums_summary
            ORDER BY last_photo_date DESC NULLS LAST, album_name ASC
            "#,
        )?;
        let albums = stmt
            .query_map([], |row| {
                Ok(AlbumSummary {
                    album_key: row.get(0)?,
                    album_name: row.get(1)?,
                    photo_count: row.get(2)?,
                    enriched_count: row.get(3)?,
                    first_photo_date: row.get(4)?,
                    last_photo_date: row.get(5)?,
                    primary_sport: row.get(6)?,
                    avg_sharpness: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }

    // ========================================================================
    // Taxonomy operations
    // ========================================================================

    pub fn photos_for_taxonomy(&self, force: bool) -> Result<Vec<TaxonomyRow>> {
        let sql = if force {
            "SELECT image_key, album_name, play_type, keywords, sport_type FROM photo_metadata ORDER BY image_key"
        } else {
            "SELECT image_key, album_name, play_type, keywords, sport_type FROM photo_metadata WHERE sport_type IS NULL ORDER BY image_key"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TaxonomyRow {
                    image_key: row.get(0)?,
                    album_name: row.get(1)?,
                    play_type: row.get(2)?,
                    keywords: parse_string_array(row.get(3)?),
                    sport_type: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn assign_sport_types(&self, assignments: &[(String, String)]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                UPDATE photo_metadata
                SET sport_type = ?, updated_at = CURRENT_TIMESTAMP
                WHERE image_key = ? AND (sport_type IS NULL OR sport_type <> ?)
                "#,
            )?;
            for (image_key, sport) in assignments {
                updated += stmt.execute(rusqlite::params![sport, image_key, sport])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    // ========================================================================
    // Stats
    // ========================================================================

    pub fn catalog_stats(&self) -> Result<CatalogStats> {
        let (total_photos, enriched, albums, total_ai_cost) = self.conn.query_row(
            r#"
            SELECT COUNT(*),
                   COUNT(enriched_at),
                   COUNT(DISTINCT album_key),
                   COALESCE(SUM(ai_cost), 0.0)
            FROM photo_metadata
            "#,
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            },
        )?;

        let by_sport = self.grouped_counts("sport_type")?;
        let by_provider = self.grouped_counts("ai_provider")?;

        Ok(CatalogStats {
            total_photos,
            enriched,
            unenriched: total_photos - enriched,
            albums,
            total_ai_cost,
            by_sport,
            by_provider,
        })
    }

    fn grouped_counts(&self, column: &str) -> Result<Vec<(String, i64)>> {
        let sql = format!(
            "SELECT {col}, COUNT(*) FROM photo_metadata WHERE {col} IS NOT NULL \
             GROUP BY {col} ORDER BY COUNT(*) DESC, {col} ASC",
            col = column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::photos::SortOrder;
    use tempfile::tempdir;

    fn test_db() -> (tempfile::TempDir, SqliteDb) {
        let dir = tempdir().unwrap();
        let db = SqliteDb::open(&dir.path().join("folio.db")).unwrap();
        db.initialize().unwrap();
        (dir, db)
    }

    fn photo(key: &str, album: &str, date: Option<&str>) -> NewPhoto {
        NewPhoto {
            image_key: key.to_string(),
            album_key: album.to_string(),
            album_name: format!("{} Album", album),
            filename: format!("{}.jpg", key),
            local_path: Some(format!("/photos/{}/{}.jpg", album, key)),
            photo_date: date.map(|d| d.to_string()),
            width: Some(6000),
            height: Some(4000),
            ..Default::default()
        }
    }

    fn scores(sharpness: f64, sport: &str) -> Enrichment {
        Enrichment {
            sharpness: Some(sharpness),
            composition_score: Some(7.0),
            emotional_impact: Some(6.5),
            sport_type: Some(sport.to_string()),
            photo_category: Some("action".to_string()),
            action_intensity: Some("high".to_string()),
            keywords: vec!["spike".to_string(), "net".to_string()],
            team_names: vec!["Lincoln".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_dir, db) = test_db();
        db.initialize().unwrap();
        db.initialize().unwrap();
    }

    #[test]
    fn test_upsert_reports_outcome_and_keeps_enrichment() {
        let (_dir, db) = test_db();
        let p = photo("a1", "alb", Some("2024-10-05 18:00:00"));

        assert_eq!(db.upsert_photo(&p).unwrap(), UpsertOutcome::Inserted);
        db.save_enrichment("a1", &scores(8.0, "volleyball"), "anthropic", Some(0.002))
            .unwrap();
        assert_eq!(db.upsert_photo(&p).unwrap(), UpsertOutcome::Updated);

        let stored = db.get_photo("a1").unwrap().unwrap();
        assert_eq!(stored.sharpness, Some(8.0));
        assert_eq!(stored.sport_type.as_deref(), Some("volleyball"));
        assert_eq!(stored.keywords, vec!["spike", "net"]);
        assert_eq!(stored.ai_provider.as_deref(), Some("anthropic"));
        assert!(stored.enriched_at.is_some());
    }

    #[test]
    fn test_check_constraint_rejects_out_of_range_score() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", None)).unwrap();
        let bad = Enrichment {
            sharpness: Some(11.0),
            ..Default::default()
        };
        assert!(db.save_enrichment("a1", &bad, "gemini", None).is_err());
    }

    #[test]
    fn test_check_constraint_rejects_unknown_category() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", None)).unwrap();
        let bad = Enrichment {
            photo_category: Some("landscape".to_string()),
            ..Default::default()
        };
        assert!(db.save_enrichment("a1", &bad, "gemini", None).is_err());

        let good = Enrichment {
            photo_category: Some("celebration".to_string()),
            ..Default::default()
        };
        db.save_enrichment("a1", &good, "gemini", None).unwrap();
    }

    #[test]
    fn test_upsert_album_name_follows_album_key() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", None)).unwrap();
        db.rename_album("alb", "Lions vs Tigers").unwrap();

        // Same album: the stored (renamed) name wins over the incoming one
        db.upsert_photo(&photo("a1", "alb", None)).unwrap();
        assert_eq!(db.get_photo("a1").unwrap().unwrap().album_name, "Lions vs Tigers");

        // Moved to another album: the incoming name wins
        db.upsert_photo(&photo("a1", "other", None)).unwrap();
        let stored = db.get_photo("a1").unwrap().unwrap();
        assert_eq!(stored.album_key, "other");
        assert_eq!(stored.album_name, "other Album");
    }

    #[test]
    fn test_initialize_on_fresh_catalog_has_play_type_index() {
        let (_dir, db) = test_db();
        let count: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_photo_metadata_play_type'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_save_enrichment_unknown_key_fails() {
        let (_dir, db) = test_db();
        assert!(db
            .save_enrichment("missing", &Enrichment::default(), "gemini", None)
            .is_err());
    }

    #[test]
    fn test_enrichment_candidates_skip_enriched() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", Some("2024-10-05 18:00:00"))).unwrap();
        db.upsert_photo(&photo("a2", "alb", Some("2024-10-06 18:00:00"))).unwrap();
        db.upsert_photo(&photo("a3", "alb", None)).unwrap();
        db.save_enrichment("a2", &scores(5.0, "volleyball"), "gemini", None)
            .unwrap();

        let candidates = db.photos_needing_enrichment(None).unwrap();
        let keys: Vec<_> = candidates.iter().map(|c| c.image_key.as_str()).collect();
        assert_eq!(keys, vec!["a1", "a3"]);

        let limited = db.photos_needing_enrichment(Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_query_photos_filters_and_sorts() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", Some("2024-10-05 18:00:00"))).unwrap();
        db.upsert_photo(&photo("a2", "alb", Some("2024-10-06 18:00:00"))).unwrap();
        db.upsert_photo(&photo("b1", "other", Some("2024-09-01 10:00:00"))).unwrap();
        db.save_enrichment("a1", &scores(9.0, "volleyball"), "gemini", None)
            .unwrap();
        db.save_enrichment("a2", &scores(6.0, "volleyball"), "gemini", None)
            .unwrap();
        db.save_enrichment("b1", &scores(9.5, "basketball"), "gemini", None)
            .unwrap();

        let filter = PhotoFilter {
            sport_type: Some("Volleyball".to_string()),
            sort: SortOrder::Sharpest,
            ..Default::default()
        };
        let photos = db.query_photos(&filter).unwrap();
        let keys: Vec<_> = photos.iter().map(|p| p.image_key.as_str()).collect();
        assert_eq!(keys, vec!["a1", "a2"]);
        assert_eq!(db.count_photos(&filter).unwrap(), 2);

        let newest = db
            .query_photos(&PhotoFilter {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(newest[0].image_key, "a2");

        let searched = db
            .query_photos(&PhotoFilter {
                search: Some("OTHER album".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].image_key, "b1");

        let sharp = db
            .count_photos(&PhotoFilter {
                min_sharpness: Some(8.5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(sharp, 2);
    }

    #[test]
    fn test_albums_summary_refresh() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", Some("2024-10-05 18:00:00"))).unwrap();
        db.upsert_photo(&photo("a2", "alb", Some("2024-10-06 18:00:00"))).unwrap();
        db.upsert_photo(&photo("b1", "other", None)).unwrap();
        db.save_enrichment("a1", &scores(8.0, "volleyball"), "gemini", None)
            .unwrap();

        assert!(db.albums_summary().unwrap().is_empty());
        db.refresh_albums_summary().unwrap();

        let albums = db.albums_summary().unwrap();
        assert_eq!(albums.len(), 2);
        let alb = albums.iter().find(|a| a.album_key == "alb").unwrap();
        assert_eq!(alb.photo_count, 2);
        assert_eq!(alb.enriched_count, 1);
        assert_eq!(alb.first_photo_date.as_deref(), Some("2024-10-05 18:00:00"));
        assert_eq!(alb.last_photo_date.as_deref(), Some("2024-10-06 18:00:00"));
        assert_eq!(alb.primary_sport.as_deref(), Some("volleyball"));
        assert_eq!(alb.avg_sharpness, Some(8.0));

        db.rename_album("alb", "Renamed").unwrap();
        db.refresh_albums_summary().unwrap();
        let albums = db.albums_summary().unwrap();
        assert!(albums.iter().any(|a| a.album_name == "Renamed"));
        assert_eq!(albums.len(), 2);
    }

    #[test]
    fn test_album_photos_and_rename() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", Some("2024-10-05 18:00:00"))).unwrap();
        db.upsert_photo(&photo("a2", "alb", None)).unwrap();
        db.save_enrichment("a1", &scores(8.0, "volleyball"), "gemini", None)
            .unwrap();

        let album = db.album_photos("alb").unwrap().unwrap();
        assert_eq!(album.album_name, "alb Album");
        assert_eq!(album.photos.len(), 2);
        assert_eq!(album.photos[0].team_names, vec!["Lincoln"]);
        assert!(db.album_photos("missing").unwrap().is_none());

        assert_eq!(db.rename_album("alb", "Lincoln - Oct 5, 2024").unwrap(), 2);
        assert_eq!(
            db.get_album_name("alb").unwrap().as_deref(),
            Some("Lincoln - Oct 5, 2024")
        );
        assert_eq!(db.list_album_keys().unwrap(), vec!["alb"]);
    }

    #[test]
    fn test_taxonomy_rows_and_assignment() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", None)).unwrap();
        db.upsert_photo(&photo("a2", "alb", None)).unwrap();
        db.save_enrichment("a2", &scores(5.0, "basketball"), "gemini", None)
            .unwrap();

        let pending = db.photos_for_taxonomy(false).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].image_key, "a1");
        assert_eq!(db.photos_for_taxonomy(true).unwrap().len(), 2);

        let assignments = vec![
            ("a1".to_string(), "volleyball".to_string()),
            ("a2".to_string(), "basketball".to_string()),
        ];
        // a2 already holds the same value, so only a1 changes.
        assert_eq!(db.assign_sport_types(&assignments).unwrap(), 1);
        assert_eq!(db.assign_sport_types(&assignments).unwrap(), 0);
        assert!(db.photos_for_taxonomy(false).unwrap().is_empty());
    }

    #[test]
    fn test_catalog_stats() {
        let (_dir, db) = test_db();
        db.upsert_photo(&photo("a1", "alb", None)).unwrap();
        db.upsert_photo(&photo("a2", "alb", None)).unwrap();
        db.upsert_photo(&photo("b1", "other", None)).unwrap();
        db.save_enrichment("a1", &scores(5.0, "volleyball"), "gemini", Some(0.25))
            .unwrap();
        db.save_enrichment("b1", &scores(5.0, "volleyball"), "anthropic", Some(0.5))
            .unwrap();

        let stats = db.catalog_stats().unwrap();
        assert_eq!(stats.total_photos, 3);
        assert_eq!(stats.enriched, 2);
        assert_eq!(stats.unenriched, 1);
        assert_eq!(stats.albums, 2);
        assert!((stats.total_ai_cost - 0.75).abs() < 1e-9);
        assert_eq!(stats.by_sport, vec![("volleyball".to_string(), 2)]);
        assert_eq!(stats.by_provider.len(), 2);
    }
}
