pub const SCHEMA: &str = r#"
-- One row per photo: source columns, quality scores, categorical tags and
-- enrichment bookkeeping.
CREATE TABLE IF NOT EXISTS photo_metadata (
    image_key TEXT PRIMARY KEY,
    album_key TEXT NOT NULL,
    album_name TEXT NOT NULL,
    filename TEXT NOT NULL,

    -- Source locations
    local_path TEXT,
    image_url TEXT,
    thumbnail_url TEXT,
    original_url TEXT,

    -- EXIF
    photo_date TEXT,
    width INTEGER,
    height INTEGER,

    -- Quality scores (0-10)
    sharpness REAL CHECK (sharpness IS NULL OR (sharpness >= 0 AND sharpness <= 10)),
    composition_score REAL CHECK (composition_score IS NULL OR (composition_score >= 0 AND composition_score <= 10)),
    emotional_impact REAL CHECK (emotional_impact IS NULL OR (emotional_impact >= 0 AND emotional_impact <= 10)),

    -- Categorical tags
    sport_type TEXT,
    photo_category TEXT CHECK (photo_category IS NULL OR photo_category IN ('action', 'portrait', 'celebration', 'team', 'candid', 'venue', 'other')),
    emotion TEXT,
    action_intensity TEXT CHECK (action_intensity IS NULL OR action_intensity IN ('low', 'medium', 'high', 'peak')),
    time_of_day TEXT CHECK (time_of_day IS NULL OR time_of_day IN ('morning', 'afternoon', 'evening', 'night')),
    play_type TEXT,
    keywords TEXT,     -- JSON array
    team_names TEXT,   -- JSON array
    event_name TEXT,

    -- Enrichment bookkeeping
    ai_provider TEXT,
    ai_cost REAL CHECK (ai_cost IS NULL OR ai_cost >= 0),
    enriched_at TEXT,

    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_photo_metadata_album ON photo_metadata(album_key);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_date ON photo_metadata(photo_date);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_sport ON photo_metadata(sport_type);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_category ON photo_metadata(photo_category);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_enriched ON photo_metadata(enriched_at);
CREATE INDEX IF NOT EXISTS idx_photo_metadata_play_type ON photo_metadata(play_type);

-- Per-album aggregates, rebuilt by refresh_albums_summary()
CREATE TABLE IF NOT EXISTS albums_summary (
    album_key TEXT PRIMARY KEY,
    album_name TEXT NOT NULL,
    photo_count INTEGER NOT NULL,
    enriched_count INTEGER NOT NULL,
    first_photo_date TEXT,
    last_photo_date TEXT,
    primary_sport TEXT,
    avg_sharpness REAL,
    refreshed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Rebuilds `albums_summary` from `photo_metadata`. Runs inside a transaction.
pub const REFRESH_ALBUMS_SUMMARY: &str = r#"
DELETE FROM albums_summary;

INSERT INTO albums_summary (
    album_key, album_name, photo_count, enriched_count,
    first_photo_date, last_photo_date, primary_sport, avg_sharpness
)
SELECT
    p.album_key,
    MAX(p.album_name),
    COUNT(*),
    SUM(CASE WHEN p.enriched_at IS NOT NULL THEN 1 ELSE 0 END),
    MIN(p.photo_date),
    MAX(p.photo_date),
    (
        SELECT s.sport_type
        FROM photo_metadata s
        WHERE s.album_key = p.album_key AND s.sport_type IS NOT NULL
        GROUP BY s.sport_type
        ORDER BY COUNT(*) DESC, s.sport_type ASC
        LIMIT 1
    ),
    AVG(p.sharpness)
FROM photo_metadata p
GROUP BY p.album_key;
"#;
