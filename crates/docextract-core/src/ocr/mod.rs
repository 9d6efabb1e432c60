//! OCR collaborators.
//!
//! Scanners are synchronous; callers on the async side offload them with
//! `spawn_blocking`. Results can be wrapped in a content-addressed file cache
//! so repeated runs over the same dataset do not re-bill the OCR service.

pub(crate) mod cache;
pub(crate) mod google;

pub use cache::CachedOcr;
pub use google::GoogleVisionOcr;

use crate::error::ExtractError;
use crate::types::{PageImage, TextBox};

/// A blocking OCR engine.
pub trait OcrScanner: Send + Sync {
    /// Scanner name for logging (e.g., "google-vision").
    fn name(&self) -> &str;

    /// Recognize text fragments in reading order.
    fn scan(&self, image: &PageImage) -> Result<Vec<TextBox>, ExtractError>;
}
