//! Local import: each directory under the import root is an album, each
//! image file in it is one photo.

pub mod discovery;
pub mod hashing;
pub mod metadata;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::db::{Database, NewPhoto, UpsertOutcome};

pub use discovery::{album_location, discover_images, AlbumLocation};
pub use metadata::ImageMetadata;

#[derive(Debug, Clone)]
pub struct ScannedPhoto {
    pub path: PathBuf,
    pub filename: String,
    pub image_key: String,
    pub album: AlbumLocation,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub found: usize,
    pub new: usize,
    pub updated: usize,
    pub failed: usize,
    pub albums: usize,
}

pub struct Scanner {
    extensions: Vec<String>,
}

impl Scanner {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            extensions: config.image_extensions.clone(),
        }
    }

    /// Import every image under `root`, upserting one row per photo, then
    /// rebuild `albums_summary`.
    pub fn import_directory(&self, root: &Path, db: &Database) -> Result<ImportReport> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Import directory not found: {}", root.display()))?;

        let image_paths = discover_images(&root, &self.extensions)?;
        let mut report = ImportReport {
            found: image_paths.len(),
            ..Default::default()
        };
        info!(root = %root.display(), found = report.found, "Importing photos");

        // Hashing and EXIF reads are independent per file
        let scanned: Vec<(PathBuf, Result<ScannedPhoto>)> = image_paths
            .into_par_iter()
            .map(|path| {
                let result = scan_single_file(&root, &path);
                (path, result)
            })
            .collect();

        // A renamed album keeps its name when new photos land in it
        let mut album_names: HashMap<String, String> = HashMap::new();

        for (path, result) in scanned {
            let photo = match result {
                Ok(photo) => photo,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read photo");
                    report.failed += 1;
                    continue;
                }
            };

            let album_key = hashing::album_key(&photo.album.relative_dir);
            let album_name = match album_names.get(&album_key) {
                Some(name) => name.clone(),
                None => {
                    let name = db
                        .get_album_name(&album_key)?
                        .unwrap_or_else(|| photo.album.dir_name.clone());
                    album_names.insert(album_key.clone(), name.clone());
                    name
                }
            };

            let record = NewPhoto {
                image_key: photo.image_key.clone(),
                album_key,
                album_name,
                filename: photo.filename.clone(),
                local_path: Some(photo.path.to_string_lossy().to_string()),
                photo_date: photo.metadata.taken_at.clone(),
                width: photo.metadata.width.map(i64::from),
                height: photo.metadata.height.map(i64::from),
                ..Default::default()
            };

            match db.upsert_photo(&record) {
                Ok(UpsertOutcome::Inserted) => report.new += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Err(e) => {
                    warn!(image_key = %photo.image_key, error = %e, "Failed to store photo");
                    report.failed += 1;
                    continue;
                }
            }
            debug!(image_key = %photo.image_key, path = %photo.path.display(), "Imported");
        }

        report.albums = album_names.len();
        db.refresh_albums_summary()?;

        info!(
            found = report.found,
            new = report.new,
            updated = report.updated,
            failed = report.failed,
            "Import complete"
        );
        Ok(report)
    }
}

fn scan_single_file(root: &Path, path: &Path) -> Result<ScannedPhoto> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let image_key = hashing::image_key(path)?;
    let metadata = metadata::extract_metadata(path)?;

    Ok(ScannedPhoto {
        path: path.to_path_buf(),
        filename,
        image_key,
        album: album_location(root, path),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_database;
    use std::fs;
    use tempfile::tempdir;

    fn write_png(path: &Path, w: u32, h: u32, shade: u8) {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([shade, shade, shade]));
        img.save(path).unwrap();
    }

    fn scanner() -> Scanner {
        Scanner::new(&ScannerConfig::default())
    }

    #[test]
    fn test_import_groups_by_directory() {
        let (_db_dir, db) = temp_database();
        let photos = tempdir().unwrap();
        fs::create_dir_all(photos.path().join("Volleyball")).unwrap();
        fs::create_dir_all(photos.path().join("Football")).unwrap();
        write_png(&photos.path().join("Volleyball/a.png"), 4, 2, 10);
        write_png(&photos.path().join("Volleyball/b.png"), 4, 2, 20);
        write_png(&photos.path().join("Football/c.png"), 4, 2, 30);
        fs::write(photos.path().join("Football/notes.txt"), "skip").unwrap();

        let report = scanner().import_directory(photos.path(), &db).unwrap();
        assert_eq!(report.found, 3);
        assert_eq!(report.new, 3);
        assert_eq!(report.updated, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.albums, 2);

        let summary = db.albums_summary().unwrap();
        assert_eq!(summary.len(), 2);
        let volleyball = summary.iter().find(|a| a.album_name == "Volleyball").unwrap();
        assert_eq!(volleyball.photo_count, 2);
        assert_eq!(volleyball.album_key, hashing::album_key("Volleyball"));
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let (_db_dir, db) = temp_database();
        let photos = tempdir().unwrap();
        fs::create_dir_all(photos.path().join("Swim")).unwrap();
        write_png(&photos.path().join("Swim/a.png"), 3, 3, 1);

        scanner().import_directory(photos.path(), &db).unwrap();
        let again = scanner().import_directory(photos.path(), &db).unwrap();
        assert_eq!(again.new, 0);
        assert_eq!(again.updated, 1);
        assert_eq!(db.catalog_stats().unwrap().total_photos, 1);
    }

    #[test]
    fn test_reimport_keeps_renamed_album() {
        let (_db_dir, db) = temp_database();
        let photos = tempdir().unwrap();
        fs::create_dir_all(photos.path().join("hoops")).unwrap();
        write_png(&photos.path().join("hoops/a.png"), 3, 3, 1);
        scanner().import_directory(photos.path(), &db).unwrap();

        let key = hashing::album_key("hoops");
        db.rename_album(&key, "Lions vs Tigers - Oct 5, 2024").unwrap();

        write_png(&photos.path().join("hoops/b.png"), 3, 3, 2);
        scanner().import_directory(photos.path(), &db).unwrap();

        let album = db.album_photos(&key).unwrap().unwrap();
        assert_eq!(album.album_name, "Lions vs Tigers - Oct 5, 2024");
        assert_eq!(album.photos.len(), 2);
    }

    #[test]
    fn test_moved_photo_takes_new_album_name() {
        let (_db_dir, db) = temp_database();
        let photos = tempdir().unwrap();
        fs::create_dir_all(photos.path().join("Volleyball")).unwrap();
        write_png(&photos.path().join("Volleyball/a.png"), 3, 3, 1);
        scanner().import_directory(photos.path(), &db).unwrap();

        fs::create_dir_all(photos.path().join("Football")).unwrap();
        fs::rename(photos.path().join("Volleyball/a.png"), photos.path().join("Football/a.png")).unwrap();
        write_png(&photos.path().join("Football/b.png"), 3, 3, 2);
        let report = scanner().import_directory(photos.path(), &db).unwrap();
        assert_eq!(report.new, 1);
        assert_eq!(report.updated, 1);

        let football = db.album_photos(&hashing::album_key("Football")).unwrap().unwrap();
        assert_eq!(football.album_name, "Football");
        assert_eq!(football.photos.len(), 2);
        let names: Vec<String> = db
            .query_photos(&crate::db::PhotoFilter {
                album_key: Some(hashing::album_key("Football")),
                ..Default::default()
            })
            .unwrap()
            .into_iter()
            .map(|p| p.album_name)
            .collect();
        assert_eq!(names, vec!["Football", "Football"]);

        let summary = db.albums_summary().unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].album_name, "Football");
        assert_eq!(summary[0].photo_count, 2);
    }

    #[test]
    fn test_moved_photo_joins_renamed_album() {
        let (_db_dir, db) = temp_database();
        let photos = tempdir().unwrap();
        fs::create_dir_all(photos.path().join("hoops")).unwrap();
        fs::create_dir_all(photos.path().join("misc")).unwrap();
        write_png(&photos.path().join("hoops/a.png"), 3, 3, 1);
        write_png(&photos.path().join("misc/b.png"), 3, 3, 2);
        scanner().import_directory(photos.path(), &db).unwrap();

        let hoops = hashing::album_key("hoops");
        db.rename_album(&hoops, "Lions vs Tigers - Oct 5, 2024").unwrap();
        fs::rename(photos.path().join("misc/b.png"), photos.path().join("hoops/b.png")).unwrap();
        scanner().import_directory(photos.path(), &db).unwrap();

        let album = db.album_photos(&hoops).unwrap().unwrap();
        assert_eq!(album.photos.len(), 2);
        let summary = db.albums_summary().unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].album_name, "Lions vs Tigers - Oct 5, 2024");
    }

    #[test]
    fn test_undecodable_image_is_stored_without_dimensions() {
        let (_db_dir, db) = temp_database();
        let photos = tempdir().unwrap();
        fs::create_dir_all(photos.path().join("Misc")).unwrap();
        // Not a decodable image: still hashed and stored, just without dimensions
        fs::write(photos.path().join("Misc/broken.jpg"), b"not really a jpeg").unwrap();

        let report = scanner().import_directory(photos.path(), &db).unwrap();
        assert_eq!(report.new, 1);
        assert_eq!(report.failed, 0);

        let key = {
            let dir = tempdir().unwrap();
            let p = dir.path().join("x");
            fs::write(&p, b"not really a jpeg").unwrap();
            hashing::image_key(&p).unwrap()
        };
        let photo = db.get_photo(&key).unwrap().unwrap();
        assert_eq!(photo.width, None);
        assert_eq!(photo.filename, "broken.jpg");
    }

    #[test]
    fn test_missing_root_errors() {
        let (_db_dir, db) = temp_database();
        let dir = tempdir().unwrap();
        assert!(scanner().import_directory(&dir.path().join("absent"), &db).is_err());
    }
}
