//! Resized-variant URLs for stored images.
//!
//! Nothing in the database describes the variants: they are derived from the
//! file id, its extension and the configured static-asset host.
use crate::model::{ImageFile, Photo, Resized};

const DEFAULT_EXTENSION: &str = "jpg";
const WIDTHS: [&str; 5] = ["w480", "w800", "w1200", "w1600", "w2400"];

/// Static-asset host used to build variant URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHost {
    base: String,
}

impl MediaHost {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Variant URLs for `file_id`. An empty file id yields empty URLs; an
    /// empty extension falls back to `jpg`.
    pub fn resized(&self, file_id: &str, extension: &str) -> Resized {
        if file_id.is_empty() {
            return Resized::default();
        }
        let ext = if extension.is_empty() {
            DEFAULT_EXTENSION
        } else {
            extension
        };
        let variant = |size: &str| format!("{}/{}-{}.{}", self.base, file_id, size, ext);
        let [w480, w800, w1200, w1600, w2400] = WIDTHS.map(variant);
        Resized {
            original: format!("{}/{}.{}", self.base, file_id, ext),
            w480,
            w800,
            w1200,
            w1600,
            w2400,
        }
    }

    pub fn photo(&self, image: &ImageRecord) -> Photo {
        Photo {
            id: image.id.to_string(),
            image_file: ImageFile {
                width: image.width.unwrap_or_default(),
                height: image.height.unwrap_or_default(),
            },
            resized: self.resized(&image.file_id, &image.extension),
            resized_webp: self.resized(&image.file_id, "webp"),
        }
    }
}

/// Stored image metadata as read from the `Image` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: i32,
    pub file_id: String,
    pub extension: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}
