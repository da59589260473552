//! Shared engine wiring for every command.
//!
//! One cache directory, one render invoker and one raw-frame cache per
//! process; preview sessions, one-shot frames and exports all go through it.

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::core::cache_dir::CacheDir;
use crate::core::cancel::CancelToken;
use crate::core::error::{PreviewError, PreviewResult};
use crate::core::export::ExportEncoder;
use crate::core::filters::FilterState;
use crate::core::frame_cache::{RawFrameCache, RawFrameKey};
use crate::core::pipeline::{FrameRenderer, PreviewPipeline, RenderRequest};
use crate::core::render::RenderInvoker;
use crate::core::scheduler::{PreviewScheduler, SchedulerConfig};
use crate::core::source::{FfmpegFrameSource, FrameSource};

pub struct Shell {
    pub settings: Settings,
    cache_dir: Arc<CacheDir>,
    invoker: Arc<RenderInvoker>,
    pipeline: Arc<PreviewPipeline>,
}

impl Shell {
    pub fn new(settings: Settings) -> PreviewResult<Self> {
        let cache_dir = Arc::new(CacheDir::create(settings.cache_parent.as_deref())?);
        let invoker = Arc::new(RenderInvoker::new(settings.tool.clone(), Arc::clone(&cache_dir)));
        let cache = Arc::new(RawFrameCache::new(Arc::clone(&cache_dir)));
        let pipeline = Arc::new(PreviewPipeline::new(cache, Arc::clone(&invoker)));
        debug!("Shell ready: {:?}", settings);
        Ok(Self {
            settings,
            cache_dir,
            invoker,
            pipeline,
        })
    }

    pub fn cache_dir(&self) -> &Arc<CacheDir> {
        &self.cache_dir
    }

    pub fn invoker(&self) -> &Arc<RenderInvoker> {
        &self.invoker
    }

    pub fn pipeline(&self) -> &Arc<PreviewPipeline> {
        &self.pipeline
    }

    /// Open a video file as a frame source.
    pub fn open_source(&self, path: &Path) -> Arc<FfmpegFrameSource> {
        info!("Opening {}", path.display());
        Arc::new(FfmpegFrameSource::open(
            path,
            Arc::clone(&self.invoker),
            self.settings.capture_quality,
        ))
    }

    /// Start a preview scheduler rendering through this shell's pipeline.
    pub fn spawn_scheduler(&self) -> std::io::Result<PreviewScheduler> {
        let renderer: Arc<dyn FrameRenderer> = Arc::clone(&self.pipeline) as Arc<dyn FrameRenderer>;
        PreviewScheduler::spawn(
            renderer,
            Some(Arc::clone(&self.cache_dir)),
            SchedulerConfig {
                debounce_ms: self.settings.debounce_ms,
                render_workers: self.settings.render_workers,
            },
        )
    }

    /// Render a single filtered frame synchronously, bypassing the scheduler.
    pub fn render_frame(
        &self,
        source: Arc<dyn FrameSource>,
        timestamp: f64,
        filters: &FilterState,
    ) -> PreviewResult<PathBuf> {
        let request = RenderRequest {
            id: 0,
            key: RawFrameKey::new(0, timestamp),
            timestamp,
            filters: filters.clone(),
            source,
        };
        // A fresh token is never cancelled, so `None` is not expected here
        match self.pipeline.render(&request, &CancelToken::new())? {
            Some(path) => Ok(path),
            None => Err(PreviewError::NoFrameCaptured { timestamp }),
        }
    }

    pub fn exporter(&self) -> ExportEncoder {
        ExportEncoder::new(Arc::clone(&self.invoker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptySource;

    impl FrameSource for EmptySource {
        fn capture(&self, _timestamp: f64) -> PreviewResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn settings(tool: &str, parent: &Path) -> Settings {
        Settings {
            tool: tool.to_string(),
            cache_parent: Some(parent.to_path_buf()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_cache_dir_created_under_configured_parent() {
        let parent = tempfile::tempdir().unwrap();
        let shell = Shell::new(settings("ffmpeg", parent.path())).unwrap();
        assert!(shell.cache_dir().path().starts_with(parent.path()));
        assert_eq!(shell.invoker().tool(), "ffmpeg");
    }

    #[test]
    fn test_render_frame_reports_empty_capture() {
        let parent = tempfile::tempdir().unwrap();
        let shell = Shell::new(settings("livegrade-no-such-tool-xyz", parent.path())).unwrap();
        let err = shell
            .render_frame(Arc::new(EmptySource), 4.0, &FilterState::default())
            .unwrap_err();
        assert!(matches!(err, PreviewError::NoFrameCaptured { .. }));
    }
}
