pub const POSTGRES_SCHEMA: &str = r#"
-- PostgreSQL schema for folio

CREATE TABLE IF NOT EXISTS photo_metadata (
    image_key TEXT PRIMARY KEY,
    album_key TEXT NOT NULL,
    album_name TEXT NOT NULL,
    filename TEXT NOT NULL,

    local_path TEXT,
    image_url TEXT,
    thumbnail_url TEXT,
    original_url TEXT,

    photo_date TEXT,
    width BIGINT,
    height BIGINT,

    sharpness DOUBLE PRECISION CHECK (sharpness IS NULL OR (sharpness >= 0 AND sharpness <= 10)),
    composition_score DOUBLE PRECISION CHECK (composition_score IS NULL OR (composition_score >= 0 AND composition_score <= 10)),
    emotional_impact DOUBLE PRECISION CHECK (emotional_impact IS NULL OR (emotional_impact >= 0 AND emotional_impact <= 10)),

    sport_type TEXT,
    photo_category TEXT CHECK (photo_category IS NULL OR photo_category IN ('action', 'portrait', 'celebration', 'team', 'candid', 'venue', 'other')),
    emotion TEXT,
    action_intensity TEXT CHECK (action_intensity IS NULL OR action_intensity IN ('low', 'medium', 'high', 'peak')),
    time_of_day TEXT CHECK (time_of_day IS NULL OR time_of_day IN ('morning', 'afternoon', 'evening', 'night')),
    play_type TEXT,
    keywords TEXT,
    team_names TEXT,
    event_name TEXT,

    ai_provider TEXT,
    ai_cost DOUBLE PRECISION CHECK (ai_cost IS NULL OR ai_cost >= 0),
    enriched_at TEXT,

    created_at TEXT NOT NULL DEFAULT to_char(now(), 'YYYY-MM-DD HH24:MI:SS'),
    updated_at TEXT NOT NULL DEFAULT to_char(now(), 'YYYY-MM-DD HH24:MI:SS')
);

CREATE INDEX IF NOT EXISTS idx_photo_metadata_album ON photo_metadata(album_key);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_date ON photo_metadata(photo_date);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_sport ON photo_metadata(sport_type);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_category ON photo_metadata(photo_category);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_enriched ON photo_metadata(enriched_at);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_play_type ON photo_metadata(play_type);

CREATE MATERIALIZED VIEW IF NOT EXISTS albums_summary AS
SELECT
    p.album_key,
    MAX(p.album_name) AS album_name,
    COUNT(*) AS photo_count,
    COUNT(p.enriched_at) AS enriched_count,
    MIN(p.photo_date) AS first_photo_date,
    MAX(p.photo_date) AS last_photo_date,
    (
        SELECT s.sport_type
        FROM photo_metadata s
        WHERE s.album_key = p.album_key AND s.sport_type IS NOT NULL
        GROUP BY s.sport_type
        ORDER BY COUNT(*) DESC, s.sport_type ASC
        LIMIT 1
    ) AS primary_sport,
    AVG(p.sharpness) AS avg_sharpness
FROM photo_metadata p
GROUP BY p.album_key;

CREATE UNIQUE INDEX IF NOT EXISTS idx_albums_summary_key ON albums_summary(album_key);
"#;
