//! Raw frame cache keyed by timeline position.
//!
//! A raw frame is the unfiltered still captured from the source at a
//! quantized timestamp. Its file name is a pure function of the key, so the
//! file's existence is the cache state; nothing is evicted until the cache
//! directory is emptied on the next source load.
//!
//! Concurrent requests for the same key are collapsed: the first caller runs
//! the capture, later callers block on the same `OnceCell` and receive the
//! same result (single-flight).

use log::{debug, trace};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::cache_dir::CacheDir;
use crate::core::error::{PreviewError, PreviewResult};
use crate::core::source::FrameSource;

/// Cache statistics for monitoring
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    captures: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture(&self) {
        self.captures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Captures actually executed (misses joined onto an in-flight capture are not counted)
    pub fn captures(&self) -> u64 {
        self.captures.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 { 0.0 } else { self.hits() as f64 / total as f64 }
    }
}

/// Cache key: source generation plus timestamp quantized to milliseconds.
///
/// The generation changes on every source load, so a late capture from a
/// previous source can never be mistaken for the current one's frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawFrameKey {
    pub generation: u64,
    pub millis: i64,
}

impl RawFrameKey {
    pub fn new(generation: u64, timestamp: f64) -> Self {
        Self {
            generation,
            millis: (timestamp * 1000.0).round() as i64,
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    pub fn file_name(&self) -> String {
        format!("frame-raw-{}-{}.jpeg", self.generation, self.millis)
    }
}

type InFlight = Arc<OnceCell<PreviewResult<PathBuf>>>;

pub struct RawFrameCache {
    dir: Arc<CacheDir>,
    in_flight: Mutex<HashMap<RawFrameKey, InFlight>>,
    stats: CacheStats,
}

impl RawFrameCache {
    pub fn new(dir: Arc<CacheDir>) -> Self {
        Self {
            dir,
            in_flight: Mutex::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    pub fn path_for(&self, key: RawFrameKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Return the raw frame for `key`, capturing it from `source` if absent.
    pub fn ensure_raw_frame(&self, key: RawFrameKey, source: &dyn FrameSource) -> PreviewResult<PathBuf> {
        let path = self.path_for(key);
        if path.is_file() {
            self.stats.record_hit();
            trace!("Raw frame hit: {}", path.display());
            return Ok(path);
        }
        self.stats.record_miss();

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(in_flight.entry(key).or_default())
        };

        let result = cell
            .get_or_init(|| {
                // Another flight may have finished between the existence check and here
                if path.is_file() {
                    return Ok(path.clone());
                }
                self.stats.record_capture();
                self.capture_to(key, &path, source)
            })
            .clone();

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if in_flight.get(&key).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
            in_flight.remove(&key);
        }

        result
    }

    /// Capture, reject empty output, then publish atomically under `path`.
    fn capture_to(&self, key: RawFrameKey, path: &Path, source: &dyn FrameSource) -> PreviewResult<PathBuf> {
        debug!("Capturing raw frame {:.3}s from {}", key.timestamp(), source.describe());
        let bytes = source.capture(key.timestamp())?;
        if bytes.is_empty() {
            return Err(PreviewError::NoFrameCaptured {
                timestamp: key.timestamp(),
            });
        }

        let dir = self.dir.path();
        let mut tmp = tempfile::Builder::new()
            .prefix(".capture-")
            .tempfile_in(dir)
            .map_err(|e| PreviewError::fs(dir, e))?;
        tmp.write_all(&bytes).map_err(|e| PreviewError::fs(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| PreviewError::fs(path, e.error))?;

        Ok(path.to_path_buf())
    }
}
