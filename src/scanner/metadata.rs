use anyhow::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Capture time as `YYYY-MM-DD HH:MM:SS`.
    pub taken_at: Option<String>,
}

pub fn extract_metadata(path: &Path) -> Result<ImageMetadata> {
    let mut metadata = ImageMetadata::default();

    if let Ok(file) = File::open(path) {
        let mut bufreader = BufReader::new(file);
        if let Ok(exif) = exif::Reader::new().read_from_container(&mut bufreader) {
            if let Some(field) = exif.get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY) {
                metadata.taken_at = exif_datetime(&field.value);
            }
            if metadata.taken_at.is_none() {
                if let Some(field) = exif.get_field(exif::Tag::DateTime, exif::In::PRIMARY) {
                    metadata.taken_at = exif_datetime(&field.value);
                }
            }

            if let Some(field) = exif.get_field(exif::Tag::PixelXDimension, exif::In::PRIMARY) {
                metadata.width = field.value.get_uint(0);
            }
            if let Some(field) = exif.get_field(exif::Tag::PixelYDimension, exif::In::PRIMARY) {
                metadata.height = field.value.get_uint(0);
            }
        }
    }

    // EXIF often lacks pixel dimensions (PNG, stripped JPEGs)
    if metadata.width.is_none() || metadata.height.is_none() {
        if let Ok((w, h)) = image::image_dimensions(path) {
            metadata.width = Some(w);
            metadata.height = Some(h);
        }
    }

    Ok(metadata)
}

fn exif_datetime(value: &exif::Value) -> Option<String> {
    let exif::Value::Ascii(ref parts) = value else {
        return None;
    };
    let raw = parts.first()?;
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    if dt.year == 0 || dt.month == 0 || dt.day == 0 {
        return None;
    }
    Some(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_exif_datetime_format() {
        let value = exif::Value::Ascii(vec![b"2024:10:05 14:03:09".to_vec()]);
        assert_eq!(exif_datetime(&value).as_deref(), Some("2024-10-05 14:03:09"));
    }

    #[test]
    fn test_exif_datetime_rejects_blank() {
        let value = exif::Value::Ascii(vec![b"0000:00:00 00:00:00".to_vec()]);
        assert_eq!(exif_datetime(&value), None);
        assert_eq!(exif_datetime(&exif::Value::Short(vec![1])), None);
    }

    #[test]
    fn test_dimensions_fall_back_to_image_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::new(7, 3).save(&path).unwrap();

        let meta = extract_metadata(&path).unwrap();
        assert_eq!(meta.width, Some(7));
        assert_eq!(meta.height, Some(3));
        assert_eq!(meta.taken_at, None);
    }
}
