//! Core data types: page images, documents and OCR fragments.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// One scanned document page.
///
/// Holds the encoded bytes (sent to the OCR service and used as the cache
/// key) together with the decoded pixel dimensions needed by the layout
/// formatter. Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone)]
pub struct PageImage {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl PageImage {
    /// Wrap encoded image bytes, reading the dimensions from the header.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExtractError> {
        let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| ExtractError::Image {
                message: format!("Cannot detect image format: {e}"),
            })?
            .into_dimensions()
            .map_err(|e| ExtractError::Image {
                message: e.to_string(),
            })?;

        Ok(Self {
            bytes: bytes.into(),
            width,
            height,
        })
    }

    /// Read and validate an image file.
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::Image {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_bytes(bytes)
    }

    /// Build a page from bytes with known dimensions (no header parsing).
    pub fn with_dimensions(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes: bytes.into(),
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// BLAKE3 hex digest of the encoded bytes.
    pub fn content_hash(&self) -> String {
        blake3::hash(&self.bytes).to_hex().to_string()
    }
}

/// Input to an extraction call: one image, or an ordered list of pages.
#[derive(Debug, Clone)]
pub enum Document {
    Single(PageImage),
    Pages(Vec<PageImage>),
}

impl Document {
    pub fn page_count(&self) -> usize {
        match self {
            Document::Single(_) => 1,
            Document::Pages(pages) => pages.len(),
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// A recognized text fragment and where it sits on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub text: String,
    #[serde(default)]
    pub bbox: BoundingBox,
}

impl TextBox {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            bbox: BoundingBox {
                x,
                y,
                width,
                height,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    /// Encode a blank PNG of the given size.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_page_image_reads_dimensions() {
        let page = PageImage::from_bytes(png_bytes(64, 32)).unwrap();
        assert_eq!(page.width(), 64);
        assert_eq!(page.height(), 32);
    }

    #[test]
    fn test_page_image_rejects_garbage() {
        let err = PageImage::from_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, ExtractError::Image { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let err = PageImage::open(Path::new("/nonexistent/scan.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scan.png"));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = PageImage::with_dimensions(vec![1, 2, 3], 1, 1);
        let b = PageImage::with_dimensions(vec![1, 2, 3], 5, 5);
        let c = PageImage::with_dimensions(vec![3, 2, 1], 1, 1);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_text_box_deserializes_without_geometry() {
        let tb: TextBox = serde_json::from_str(r#"{"text":"A"}"#).unwrap();
        assert_eq!(tb.text, "A");
        assert_eq!(tb.bbox, BoundingBox::default());
    }
}
