//! SQLite-to-PostgreSQL migration tool.
//!
//! Copies every `photo_metadata` row from a local SQLite catalog into a
//! PostgreSQL database, then refreshes the `albums_summary` materialized view.
//! Existing rows in PostgreSQL are overwritten, so the copy can be re-run.

use anyhow::{Context, Result};
use postgres::NoTls;
use rusqlite::Connection;
use tracing::info;

use super::photos::PHOTO_COLUMNS;
use super::postgres_schema::POSTGRES_SCHEMA;

/// Migrate the catalog from a SQLite database to a PostgreSQL database.
/// Returns the number of rows copied.
pub fn migrate_sqlite_to_postgres(sqlite_path: &std::path::Path, postgres_url: &str) -> Result<u64> {
    let sqlite = Connection::open(sqlite_path)
        .with_context(|| format!("Failed to open SQLite database: {}", sqlite_path.display()))?;

    let mut pg = postgres::Client::connect(postgres_url, NoTls)
        .with_context(|| "Failed to connect to PostgreSQL")?;

    info!("Creating PostgreSQL schema");
    pg.batch_execute(POSTGRES_SCHEMA)
        .with_context(|| "Failed to create PostgreSQL schema")?;

    let count = migrate_photo_metadata(&sqlite, &mut pg)?;

    pg.batch_execute("REFRESH MATERIALIZED VIEW albums_summary")
        .with_context(|| "Failed to refresh albums_summary")?;

    info!(rows = count, "Migration complete");
    Ok(count)
}

fn migrate_photo_metadata(sqlite: &Connection, pg: &mut postgres::Client) -> Result<u64> {
    let sql = format!("SELECT {} FROM photo_metadata", PHOTO_COLUMNS);
    let mut stmt = sqlite.prepare(&sql)?;

    let rows = stmt.query_map([], |row| {
        Ok((
            (
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, Option<i64>>(9)?,
                row.get::<_, Option<i64>>(10)?,
            ),
            (
                row.get::<_, Option<f64>>(11)?,
                row.get::<_, Option<f64>>(12)?,
                row.get::<_, Option<f64>>(13)?,
                row.get::<_, Option<String>>(14)?,
                row.get::<_, Option<String>>(15)?,
                row.get::<_, Option<String>>(16)?,
                row.get::<_, Option<String>>(17)?,
                row.get::<_, Option<String>>(18)?,
                row.get::<_, Option<String>>(19)?,
                row.get::<_, Option<String>>(20)?,
                row.get::<_, Option<String>>(21)?,
                row.get::<_, Option<String>>(22)?,
            ),
            (
                row.get::<_, Option<String>>(23)?,
                row.get::<_, Option<f64>>(24)?,
                row.get::<_, Option<String>>(25)?,
                row.get::<_, String>(26)?,
                row.get::<_, String>(27)?,
            ),
        ))
    })?;

    let insert = format!(
        "INSERT INTO photo_metadata ({}) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
            $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23,
            $24, $25, $26, $27, $28)
         ON CONFLICT (image_key) DO UPDATE SET
            album_key = EXCLUDED.album_key,
            album_name = EXCLUDED.album_name,
            filename = EXCLUDED.filename,
            local_path = EXCLUDED.local_path,
            image_url = EXCLUDED.image_url,
            thumbnail_url = EXCLUDED.thumbnail_url,
            original_url = EXCLUDED.original_url,
            photo_date = EXCLUDED.photo_date,
            width = EXCLUDED.width,
            height = EXCLUDED.height,
            sharpness = EXCLUDED.sharpness,
            composition_score = EXCLUDED.composition_score,
            emotional_impact = EXCLUDED.emotional_impact,
            sport_type = EXCLUDED.sport_type,
            photo_category = EXCLUDED.photo_category,
            emotion = EXCLUDED.emotion,
            action_intensity = EXCLUDED.action_intensity,
            time_of_day = EXCLUDED.time_of_day,
            play_type = EXCLUDED.play_type,
            keywords = EXCLUDED.keywords,
            team_names = EXCLUDED.team_names,
            event_name = EXCLUDED.event_name,
            ai_provider = EXCLUDED.ai_provider,
            ai_cost = EXCLUDED.ai_cost,
            enriched_at = EXCLUDED.enriched_at,
            updated_at = EXCLUDED.updated_at",
        PHOTO_COLUMNS
    );

    let mut tx = pg.transaction()?;
    let stmt = tx.prepare(insert.as_str())?;

    let mut count = 0u64;
    for row in rows {
        let (source, tags, bookkeeping) = row?;
        tx.execute(
            &stmt,
            &[
                &source.0, &source.1, &source.2, &source.3, &source.4, &source.5,
                &source.6, &source.7, &source.8, &source.9, &source.10,
                &tags.0, &tags.1, &tags.2, &tags.3, &tags.4, &tags.5,
                &tags.6, &tags.7, &tags.8, &tags.9, &tags.10, &tags.11,
                &bookkeeping.0, &bookkeeping.1, &bookkeeping.2, &bookkeeping.3, &bookkeeping.4,
            ],
        )?;
        count += 1;
        if count % 1000 == 0 {
            info!(rows = count, "Migrating photo_metadata");
        }
    }
    tx.commit()?;

    Ok(count)
}
