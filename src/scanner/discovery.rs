use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_images(directory: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                if extensions.iter().any(|e| e.to_lowercase() == ext_lower) {
                    images.push(path.to_path_buf());
                }
            }
        }
    }

    // Sort by path for consistent ordering
    images.sort();

    Ok(images)
}

/// Where a photo belongs: its album directory relative to the import root
/// and the name shown for that album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumLocation {
    pub relative_dir: String,
    pub dir_name: String,
}

/// Files directly under the root form an album named after the root itself.
pub fn album_location(root: &Path, image: &Path) -> AlbumLocation {
    let parent = image.parent().unwrap_or(root);
    let relative = parent.strip_prefix(root).unwrap_or(parent);

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    let relative_dir = if parts.is_empty() { ".".to_string() } else { parts.join("/") };

    let dir_name = parent
        .file_name()
        .or_else(|| root.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string());

    AlbumLocation { relative_dir, dir_name }
}
