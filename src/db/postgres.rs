//! PostgreSQL backend implementation.

use anyhow::Result;
use postgres::types::ToSql;
use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;

use super::albums::{AlbumPhoto, AlbumPhotos, AlbumSummary, CatalogStats};
use super::photos::{
    encode_string_array, parse_string_array, Enrichment, EnrichmentCandidate, FilterValue,
    NewPhoto, PhotoFilter, PhotoRecord, TaxonomyRow, UpsertOutcome, PHOTO_COLUMNS,
};
use super::postgres_schema::POSTGRES_SCHEMA;

const NOW_TEXT: &str = "to_char(now(), 'YYYY-MM-DD HH24:MI:SS')";

pub struct PgDb {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

fn pg_placeholder(n: usize) -> String {
    format!("${}", n)
}

fn boxed_params(params: Vec<FilterValue>) -> Vec<Box<dyn ToSql + Sync>> {
    params
        .into_iter()
        .map(|p| -> Box<dyn ToSql + Sync> {
            match p {
                FilterValue::Text(s) => Box::new(s),
                FilterValue::Real(v) => Box::new(v),
            }
        })
        .collect()
}

fn row_to_photo(row: &postgres::Row) -> PhotoRecord {
    PhotoRecord {
        image_key: row.get(0),
        album_key: row.get(1),
        album_name: row.get(2),
        filename: row.get(3),
        local_path: row.get(4),
        image_url: row.get(5),
        thumbnail_url: row.get(6),
        original_url: row.get(7),
        photo_date: row.get(8),
        width: row.get(9),
        height: row.get(10),
        sharpness: row.get(11),
        composition_score: row.get(12),
        emotional_impact: row.get(13),
        sport_type: row.get(14),
        photo_category: row.get(15),
        emotion: row.get(16),
        action_intensity: row.get(17),
        time_of_day: row.get(18),
        play_type: row.get(19),
        keywords: parse_string_array(row.get(20)),
        team_names: parse_string_array(row.get(21)),
        event_name: row.get(22),
        ai_provider: row.get(23),
        ai_cost: row.get(24),
        enriched_at: row.get(25),
        created_at: row.get(26),
        updated_at: row.get(27),
    }
}

impl PgDb {
    pub fn open(url: &str, pool_size: u32) -> Result<Self> {
        let manager = PostgresConnectionManager::new(url.parse()?, NoTls);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Ok(Self { pool })
    }

    pub fn initialize(&self) -> Result<()> {
        let mut client = self.pool.get()?;
        client.batch_execute(POSTGRES_SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    pub fn upsert_photo(&self, photo: &NewPhoto) -> Result<UpsertOutcome> {
        let mut client = self.pool.get()?;
        let sql = format!(
            r#"
            INSERT INTO photo_metadata (
                image_key, album_key, album_name, filename,
                local_path, image_url, thumbnail_url, original_url,
                photo_date, width, height
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (image_key) DO UPDATE SET
                album_name = CASE WHEN photo_metadata.album_key = EXCLUDED.album_key
                    THEN photo_metadata.album_name ELSE EXCLUDED.album_name END,
                album_key = EXCLUDED.album_key,
                filename = EXCLUDED.filename,
                local_path = COALESCE(EXCLUDED.local_path, photo_metadata.local_path),
                image_url = COALESCE(EXCLUDED.image_url, photo_metadata.image_url),
                thumbnail_url = COALESCE(EXCLUDED.thumbnail_url, photo_metadata.thumbnail_url),
                original_url = COALESCE(EXCLUDED.original_url, photo_metadata.original_url),
                photo_date = COALESCE(EXCLUDED.photo_date, photo_metadata.photo_date),
                width = COALESCE(EXCLUDED.width, photo_metadata.width),
                height = COALESCE(EXCLUDED.height, photo_metadata.height),
                updated_at = {now}
            RETURNING (xmax = 0) AS inserted
            "#,
            now = NOW_TEXT
        );
        let row = client.query_one(
            sql.as_str(),
            &[
                &photo.image_key,
                &photo.album_key,
                &photo.album_name,
                &photo.filename,
                &photo.local_path,
                &photo.image_url,
                &photo.thumbnail_url,
                &photo.original_url,
                &photo.photo_date,
                &photo.width,
                &photo.height,
            ],
        )?;
        let inserted: bool = row.get(0);
        Ok(if inserted { UpsertOutcome::Inserted } else { UpsertOutcome::Updated })
    }

    pub fn photo_exists(&self, image_key: &str) -> Result<bool> {
        let mut client = self.pool.get()?;
        let row = client.query_opt(
            "SELECT 1 FROM photo_metadata WHERE image_key = $1",
            &[&image_key],
        )?;
        Ok(row.is_some())
    }

    pub fn get_photo(&self, image_key: &str) -> Result<Option<PhotoRecord>> {
        let mut client = self.pool.get()?;
        let sql = format!("SELECT {} FROM photo_metadata WHERE image_key = $1", PHOTO_COLUMNS);
        let row = client.query_opt(sql.as_str(), &[&image_key])?;
        Ok(row.as_ref().map(row_to_photo))
    }

    pub fn query_photos(&self, filter: &PhotoFilter) -> Result<Vec<PhotoRecord>> {
        let mut client = self.pool.get()?;
        let (where_clause, params) = filter.where_clause(pg_placeholder);
        let sql = format!(
            "SELECT {} FROM photo_metadata {} ORDER BY {} {}",
            PHOTO_COLUMNS,
            where_clause,
            filter.sort.order_by(),
            filter.paging_clause()
        );
        let params = boxed_params(params);
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
        let rows = client.query(sql.as_str(), &refs)?;
        Ok(rows.iter().map(row_to_photo).collect())
    }

    pub fn count_photos(&self, filter: &PhotoFilter) -> Result<i64> {
        let mut client = self.pool.get()?;
        let (where_clause, params) = filter.where_clause(pg_placeholder);
        let sql = format!("SELECT COUNT(*) FROM photo_metadata {}", where_clause);
        let params = boxed_params(params);
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
        let row = client.query_one(sql.as_str(), &refs)?;
        Ok(row.get(0))
    }

    // ========================================================================
    // Enrichment operations
    // ========================================================================

    pub fn photos_needing_enrichment(&self, limit: Option<usize>) -> Result<Vec<EnrichmentCandidate>> {
        let mut client = self.pool.get()?;
        let limit: Option<i64> = limit.map(|l| l as i64);
        let rows = client.query(
            r#"
            SELECT image_key, local_path, image_url, album_name
            FROM photo_metadata
            WHERE enriched_at IS NULL
              AND (local_path IS NOT NULL OR image_url IS NOT NULL)
            ORDER BY photo_date DESC NULLS LAST, image_key ASC
            LIMIT $1
            "#,
            &[&limit],
        )?;
        Ok(rows
            .iter()
            .map(|row| EnrichmentCandidate {
                image_key: row.get(0),
                local_path: row.get(1),
                image_url: row.get(2),
                album_name: row.get(3),
            })
            .collect())
    }

    pub fn save_enrichment(
        &self,
        image_key: &str,
        enrichment: &Enrichment,
        provider: &str,
        cost: Option<f64>,
    ) -> Result<()> {
        let mut client = self.pool.get()?;
        let sql = format!(
            r#"
            UPDATE photo_metadata
            SET sharpness = $1,
                composition_score = $2,
                emotional_impact = $3,
                sport_type = COALESCE($4, sport_type),
                photo_category = $5,
                emotion = $6,
                action_intensity = $7,
                time_of_day = $8,
                play_type = $9,
                keywords = $10,
                team_names = $11,
                event_name = $12,
                ai_provider = $13,
                ai_cost = $14,
                enriched_at = {now},
                updated_at = {now}
            WHERE image_key = $15
            "#,
            now = NOW_TEXT
        );
        let keywords = encode_string_array(&enrichment.keywords);
        let team_names = encode_string_array(&enrichment.team_names);
        let updated = client.execute(
            sql.as_str(),
            &[
                &enrichment.sharpness,
                &enrichment.composition_score,
                &enrichment.emotional_impact,
                &enrichment.sport_type,
                &enrichment.photo_category,
                &enrichment.emotion,
                &enrichment.action_intensity,
                &enrichment.time_of_day,
                &enrichment.play_type,
                &keywords,
                &team_names,
                &enrichment.event_name,
                &provider,
                &cost,
                &image_key,
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
        let mut client = self.pool.get()?;
        let rows = client.query(
            "SELECT DISTINCT album_key FROM photo_metadata ORDER BY album_key",
            &[],
        )?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    pub fn get_album_name(&self, album_key: &str) -> Result<Option<String>> {
        let mut client = self.pool.get()?;
        let row = client.query_opt(
            "SELECT album_name FROM photo_metadata WHERE album_key = $1 LIMIT 1",
            &[&album_key],
        )?;
        Ok(row.map(|r| r.get(0)))
    }

    pub fn album_photos(&self, album_key: &str) -> Result<Option<AlbumPhotos>> {
        let mut client = self.pool.get()?;
        let rows = client.query(
            r#"
            SELECT album_name, photo_date, team_names, event_name, sport_type
            FROM photo_metadata
            WHERE album_key = $1
            ORDER BY photo_date ASC NULLS LAST, image_key ASC
            "#,
            &[&album_key],
        )?;
        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let album_name: String = first.get(0);
        let photos = rows
            .iter()
            .map(|row| AlbumPhoto {
                photo_date: row.get(1),
                team_names: parse_string_array(row.get(2)),
                event_name: row.get(3),
                sport_type: row.get(4),
            })
            .collect();
        Ok(Some(AlbumPhotos {
            album_key: album_key.to_string(),
            album_name,
            photos,
        }))
    }

    pub fn rename_album(&self, album_key: &str, new_name: &str) -> Result<usize> {
        let mut client = self.pool.get()?;
        let sql = format!(
            "UPDATE photo_metadata SET album_name = $1, updated_at = {} WHERE album_key = $2",
            NOW_TEXT
        );
        let updated = client.execute(sql.as_str(), &[&new_name, &album_key])?;
        Ok(updated as usize)
    }

    pub fn refresh_albums_summary(&self) -> Result<()> {
        let mut client = self.pool.get()?;
        client.batch_execute("REFRESH MATERIALIZED VIEW CONCURRENTLY albums_summary")?;
        Ok(())
    }

    pub fn albums_summary(&self) -> Result<Vec<AlbumSummary>> {
        let mut client = self.pool.get()?;
        let rows = client.query(
            r#"
            SELECT album_key, album_name, photo_count, enriched_count,
                   first_photo_date, last_photo_date, primary_sport, avg_sharpness
            FROM albums_summary
            ORDER BY last_photo_date DESC NULLS LAST, album_name ASC
            "#,
            &[],
        )?;
        Ok(rows
            .iter()
            .map(|row| AlbumSummary {
                album_key: row.get(0),
                album_name: row.get(1),
                photo_count: row.get(2),
                enriched_count: row.get(3),
                first_photo_date: row.get(4),
                last_photo_date: row.get(5),
                primary_sport: row.get(6),
                avg_sharpness: row.get(7),
            })
            .collect())
    }

    // ========================================================================
    // Taxonomy operations
    // ========================================================================

    pub fn photos_for_taxonomy(&self, force: bool) -> Result<Vec<TaxonomyRow>> {
        let mut client = self.pool.get()?;
        let sql = if force {
            "SELECT image_key, album_name, play_type, keywords, sport_type FROM photo_metadata ORDER BY image_key"
        } else {
            "SELECT image_key, album_name, play_type, keywords, sport_type FROM photo_metadata WHERE sport_type IS NULL ORDER BY image_key"
        };
        let rows = client.query(sql, &[])?;
        Ok(rows
            .iter()
            .map(|row| TaxonomyRow {
                image_key: row.get(0),
                album_name: row.get(1),
                play_type: row.get(2),
                keywords: parse_string_array(row.get(3)),
                sport_type: row.get(4),
            })
            .collect())
    }

    pub fn assign_sport_types(&self, assignments: &[(String, String)]) -> Result<usize> {
        let mut client = self.pool.get()?;
        let mut tx = client.transaction()?;
        let sql = format!(
            r#"
            UPDATE photo_metadata
            SET sport_type = $1, updated_at = {}
            WHERE image_key = $2 AND (sport_type IS NULL OR sport_type <> $1)
            "#,
            NOW_TEXT
        );
        let stmt = tx.prepare(sql.as_str())?;
        let mut updated = 0u64;
        for (image_key, sport) in assignments {
            updated += tx.execute(&stmt, &[sport, image_key])?;
        }
        tx.commit()?;
        Ok(updated as usize)
    }

    // ========================================================================
    // Stats
    // ========================================================================

    pub fn catalog_stats(&self) -> Result<CatalogStats> {
        let mut client = self.pool.get()?;
        let row = client.query_one(
            r#"
            SELECT COUNT(*),
                   COUNT(enriched_at),
                   COUNT(DISTINCT album_key),
                   COALESCE(SUM(ai_cost), 0.0)::DOUBLE PRECISION
            FROM photo_metadata
            "#,
            &[],
        )?;
        let total_photos: i64 = row.get(0);
        let enriched: i64 = row.get(1);

        let by_sport = Self::grouped_counts(&mut client, "sport_type")?;
        let by_provider = Self::grouped_counts(&mut client, "ai_provider")?;

        Ok(CatalogStats {
            total_photos,
            enriched,
            unenriched: total_photos - enriched,
            albums: row.get(2),
            total_ai_cost: row.get(3),
            by_sport,
            by_provider,
        })
    }

    fn grouped_counts(client: &mut postgres::Client, column: &str) -> Result<Vec<(String, i64)>> {
        let sql = format!(
            "SELECT {col}, COUNT(*) FROM photo_metadata WHERE {col} IS NOT NULL \
             GROUP BY {col} ORDER BY COUNT(*) DESC, {col} ASC",
            col = column
        );
        let rows = client.query(sql.as_str(), &[])?;
        Ok(rows.iter().map(|row| (row.get(0), row.get(1))).collect())
    }
}
