use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Hex digits kept from the content digest for `image_key`.
pub const IMAGE_KEY_LEN: usize = 16;
/// Hex digits kept from the path digest for `album_key`.
pub const ALBUM_KEY_LEN: usize = 12;

/// Stable photo identity: truncated SHA-256 of the file content.
/// Re-importing the same bytes from any location yields the same key.
pub fn image_key(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..IMAGE_KEY_LEN].to_string())
}

/// Album identity: truncated SHA-256 of the album directory path relative
/// to the import root, with `/` separators.
pub fn album_key(relative_dir: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(relative_dir.as_bytes()));
    digest[..ALBUM_KEY_LEN].to_string()
}
