//! File-backed OCR cache keyed by image content.

use super::OcrScanner;
use crate::error::ExtractError;
use crate::types::{PageImage, TextBox};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One cached page, stored as a single JSON line.
#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    boxes: Vec<TextBox>,
}

/// Wraps a scanner and memoizes its results in a JSON Lines file.
///
/// Keys are BLAKE3 hashes of the encoded image bytes. Each miss appends one
/// line; duplicate keys (later lines win) are compacted away on open. The
/// map lock is not held while the inner scanner runs or while the file is
/// written, so two concurrent misses on the same image may both scan.
pub struct CachedOcr<S> {
    inner: S,
    path: PathBuf,
    entries: Mutex<HashMap<String, Vec<TextBox>>>,
    file: Mutex<()>,
}

impl<S: OcrScanner> CachedOcr<S> {
    /// Open (or start) a cache file in front of `inner`.
    ///
    /// A missing file starts an empty cache; an unreadable one is an error.
    pub fn open(inner: S, path: &Path) -> Result<Self, ExtractError> {
        let mut entries = HashMap::new();
        let mut lines = 0usize;
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ExtractError::Ocr {
                message: format!("Failed to read OCR cache {}: {e}", path.display()),
            })?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let entry: CacheEntry = serde_json::from_str(line).map_err(|e| ExtractError::Ocr {
                    message: format!("Corrupt OCR cache {}: {e}", path.display()),
                })?;
                entries.insert(entry.key, entry.boxes);
                lines += 1;
            }
        }

        let cache = Self {
            inner,
            path: path.to_path_buf(),
            entries: Mutex::new(HashMap::new()),
            file: Mutex::new(()),
        };
        if lines > entries.len() {
            tracing::debug!(
                "Compacting OCR cache {} ({lines} lines, {} pages)",
                path.display(),
                entries.len()
            );
            cache.compact(&entries)?;
        }
        tracing::debug!(
            "{} cache {} holds {} page(s)",
            cache.inner.name(),
            path.display(),
            entries.len()
        );

        Ok(Self {
            entries: Mutex::new(entries),
            ..cache
        })
    }

    /// Number of cached pages.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn io_err(&self, e: std::io::Error) -> ExtractError {
        ExtractError::Ocr {
            message: format!("Failed to write OCR cache {}: {e}", self.path.display()),
        }
    }

    fn ensure_parent(&self) -> Result<(), ExtractError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        Ok(())
    }

    fn encode(key: &str, boxes: &[TextBox]) -> Result<String, ExtractError> {
        let entry = CacheEntry {
            key: key.to_string(),
            boxes: boxes.to_vec(),
        };
        serde_json::to_string(&entry).map_err(|e| ExtractError::Ocr {
            message: e.to_string(),
        })
    }

    /// Append one entry to the cache file.
    fn append(&self, key: &str, boxes: &[TextBox]) -> Result<(), ExtractError> {
        let mut line = Self::encode(key, boxes)?;
        line.push('\n');

        let _guard = self.file.lock().map_err(|_| ExtractError::Ocr {
            message: "OCR cache file lock poisoned".to_string(),
        })?;
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(line.as_bytes()).map_err(|e| self.io_err(e))
    }

    /// Rewrite the file with one line per key.
    fn compact(&self, entries: &HashMap<String, Vec<TextBox>>) -> Result<(), ExtractError> {
        let mut content = String::new();
        for (key, boxes) in entries {
            content.push_str(&Self::encode(key, boxes)?);
            content.push('\n');
        }
        self.ensure_parent()?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

impl<S: OcrScanner> OcrScanner for CachedOcr<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn scan(&self, image: &PageImage) -> Result<Vec<TextBox>, ExtractError> {
        let key = image.content_hash();
        let poisoned = || ExtractError::Ocr {
            message: "OCR cache lock poisoned".to_string(),
        };
        {
            let entries = self.entries.lock().map_err(|_| poisoned())?;
            if let Some(hit) = entries.get(&key) {
                tracing::debug!("{} cache hit for {key}", self.name());
                return Ok(hit.clone());
            }
        }

        let boxes = self.inner.scan(image)?;

        let inserted = self
            .entries
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.clone(), boxes.clone())
            .is_none();
        if inserted {
            self.append(&key, &boxes)?;
        }
        Ok(boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingOcr {
        calls: Arc<AtomicU32>,
    }

    impl OcrScanner for CountingOcr {
        fn name(&self) -> &str {
            "counting"
        }

        fn scan(&self, image: &PageImage) -> Result<Vec<TextBox>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TextBox::new(
                format!("{} bytes", image.bytes().len()),
                0.0,
                0.0,
                10.0,
                10.0,
            )])
        }
    }

    #[test]
    fn test_cache_hit_skips_scanner() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let cache = CachedOcr::open(
            CountingOcr {
                calls: calls.clone(),
            },
            &dir.path().join(".ocr_cache"),
        )
        .unwrap();

        let page = PageImage::with_dimensions(vec![1, 2, 3], 10, 10);
        let first = cache.scan(&page).unwrap();
        let second = cache.scan(&page).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join(".ocr_cache");
        let page = PageImage::with_dimensions(vec![9, 9], 10, 10);

        let calls = Arc::new(AtomicU32::new(0));
        {
            let cache = CachedOcr::open(
                CountingOcr {
                    calls: calls.clone(),
                },
                &path,
            )
            .unwrap();
            cache.scan(&page).unwrap();
        }

        let reopened = CachedOcr::open(
            CountingOcr {
                calls: calls.clone(),
            },
            &path,
        )
        .unwrap();
        assert_eq!(reopened.len(), 1);
        let boxes = reopened.scan(&page).unwrap();
        assert_eq!(boxes[0].text, "2 bytes");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ocr_cache");
        std::fs::write(&path, "not json").unwrap();

        let result = CachedOcr::open(
            CountingOcr {
                calls: Arc::new(AtomicU32::new(0)),
            },
            &path,
        );
        assert!(matches!(result, Err(ExtractError::Ocr { .. })));
    }

    #[test]
    fn test_each_miss_appends_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ocr_cache");
        let cache = CachedOcr::open(
            CountingOcr {
                calls: Arc::new(AtomicU32::new(0)),
            },
            &path,
        )
        .unwrap();

        for n in 1..=3u8 {
            cache
                .scan(&PageImage::with_dimensions(vec![n; n as usize], 10, 10))
                .unwrap();
            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(content.lines().count(), n as usize);
        }
        // A hit writes nothing
        cache
            .scan(&PageImage::with_dimensions(vec![1], 10, 10))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_duplicate_lines_are_compacted_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ocr_cache");
        std::fs::write(
            &path,
            concat!(
                r#"{"key":"k1","boxes":[{"text":"old"}]}"#,
                "\n",
                r#"{"key":"k2","boxes":[]}"#,
                "\n",
                r#"{"key":"k1","boxes":[{"text":"new"}]}"#,
                "\n",
            ),
        )
        .unwrap();

        let cache = CachedOcr::open(
            CountingOcr {
                calls: Arc::new(AtomicU32::new(0)),
            },
            &path,
        )
        .unwrap();

        assert_eq!(cache.len(), 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("new"));
        assert!(!content.contains("old"));
    }

    #[test]
    fn test_name_is_inner_scanner_name() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CachedOcr::open(
            CountingOcr {
                calls: Arc::new(AtomicU32::new(0)),
            },
            &dir.path().join(".ocr_cache"),
        )
        .unwrap();
        assert_eq!(cache.name(), "counting");
    }
}
