//! Sidecar persistence of detection regions.
//!
//! Each image gets one JSON record stored next to it as
//! `<file_id>.boxes.json`. Writes replace the boxes and timestamp
//! wholesale; metadata is merged from the previous record only when the
//! writer omits it (merge-on-missing, not merge-on-partial).

use crate::core::OcrResult;
use crate::domain::{CacheRecord, Region, ResizeMetadata};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// File-backed store of the last computed regions per image.
pub struct BoxCache {
    dir: PathBuf,
}

impl BoxCache {
    /// Creates a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sidecar path for `file_id`.
    pub fn record_path(&self, file_id: &str) -> PathBuf {
        self.dir.join(format!("{file_id}.boxes.json"))
    }

    /// Reads the record for `file_id`. Absence is `Ok(None)`; an
    /// unreadable or corrupt record is an error.
    pub fn read(&self, file_id: &str) -> OcrResult<Option<CacheRecord>> {
        let path = self.record_path(file_id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(file_id, "region cache miss");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };
        let record: CacheRecord = serde_json::from_str(&contents)?;
        debug!(file_id, count = record.boxes.len(), "region cache hit");
        Ok(Some(record))
    }

    /// Writes a record, replacing `boxes` and `saved_at` unconditionally.
    ///
    /// When `meta` is `None`, the previous record's metadata carries
    /// over; a missing or unreadable previous record yields no metadata
    /// rather than an error.
    pub fn write(
        &self,
        file_id: &str,
        boxes: &[Region],
        meta: Option<&ResizeMetadata>,
    ) -> OcrResult<()> {
        let meta = match meta {
            Some(meta) => Some(*meta),
            None => self.previous_meta(file_id),
        };
        let record = CacheRecord {
            file_id: file_id.to_string(),
            saved_at: unix_now(),
            boxes: boxes.to_vec(),
            meta,
        };
        let path = self.record_path(file_id);
        fs::write(&path, serde_json::to_string(&record)?)?;
        debug!(
            file_id,
            count = boxes.len(),
            path = %path.display(),
            "region cache saved"
        );
        Ok(())
    }

    fn previous_meta(&self, file_id: &str) -> Option<ResizeMetadata> {
        let contents = fs::read_to_string(self.record_path(file_id)).ok()?;
        match serde_json::from_str::<CacheRecord>(&contents) {
            Ok(record) => record.meta,
            Err(error) => {
                warn!(file_id, %error, "ignoring unreadable region cache record");
                None
            }
        }
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegionKind;
    use tempfile::TempDir;

    fn region(id: &str) -> Region {
        Region {
            id: id.to_string(),
            kind: RegionKind::TextBubble,
            score: Some(0.5),
            x: 0.1,
            y: 0.1,
            w: 0.2,
            h: 0.2,
        }
    }

    fn meta() -> ResizeMetadata {
        ResizeMetadata {
            orig_size: (2000, 1000),
            resized_size: (1280, 640),
            scale: 0.64,
        }
    }

    #[test]
    fn test_read_missing_record_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = BoxCache::new(dir.path());
        assert!(cache.read("nope").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = BoxCache::new(dir.path());
        let boxes = vec![region("a"), region("b")];
        cache.write("page", &boxes, Some(&meta())).unwrap();

        let record = cache.read("page").unwrap().unwrap();
        assert_eq!(record.file_id, "page");
        assert_eq!(record.boxes, boxes);
        assert_eq!(record.meta, Some(meta()));
        assert!(record.saved_at > 0.0);
    }

    #[test]
    fn test_omitted_meta_merges_from_previous_record() {
        let dir = TempDir::new().unwrap();
        let cache = BoxCache::new(dir.path());
        cache.write("page", &[region("old")], Some(&meta())).unwrap();

        let new_boxes = vec![region("new")];
        cache.write("page", &new_boxes, None).unwrap();

        let record = cache.read("page").unwrap().unwrap();
        assert_eq!(record.boxes, new_boxes);
        assert_eq!(record.meta, Some(meta()));
    }

    #[test]
    fn test_explicit_meta_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let cache = BoxCache::new(dir.path());
        cache.write("page", &[region("a")], Some(&meta())).unwrap();

        let newer = ResizeMetadata {
            orig_size: (800, 600),
            resized_size: (800, 600),
            scale: 1.0,
        };
        cache.write("page", &[region("a")], Some(&newer)).unwrap();
        let record = cache.read("page").unwrap().unwrap();
        assert_eq!(record.meta, Some(newer));
    }

    #[test]
    fn test_corrupt_previous_record_yields_no_meta() {
        let dir = TempDir::new().unwrap();
        let cache = BoxCache::new(dir.path());
        fs::write(cache.record_path("page"), "{ not json").unwrap();

        cache.write("page", &[region("a")], None).unwrap();
        let record = cache.read("page").unwrap().unwrap();
        assert!(record.meta.is_none());
        assert_eq!(record.boxes.len(), 1);
    }

    #[test]
    fn test_read_corrupt_record_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = BoxCache::new(dir.path());
        fs::write(cache.record_path("page"), "{ not json").unwrap();
        assert!(cache.read("page").is_err());
    }
}
