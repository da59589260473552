//! One preview render: raw frame from cache (capturing if needed), then the filter pass.

use log::debug;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::cancel::CancelToken;
use crate::core::error::PreviewResult;
use crate::core::filters::{FilterState, filter_args};
use crate::core::frame_cache::{RawFrameCache, RawFrameKey};
use crate::core::render::RenderInvoker;
use crate::core::source::FrameSource;

/// Immutable snapshot of what to render, taken when the debounce fires.
#[derive(Clone)]
pub struct RenderRequest {
    pub id: u64,
    pub key: RawFrameKey,
    pub timestamp: f64,
    pub filters: FilterState,
    pub source: Arc<dyn FrameSource>,
}

impl RenderRequest {
    pub fn filter_args(&self) -> Vec<String> {
        filter_args(&self.filters)
    }
}

impl fmt::Debug for RenderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRequest")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("timestamp", &self.timestamp)
            .field("filters", &self.filters)
            .field("source", &self.source.describe())
            .finish()
    }
}

/// Produces a displayable filtered frame for a request.
///
/// `Ok(None)` means the job noticed at a resumption point that it was
/// superseded and stopped early.
pub trait FrameRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest, token: &CancelToken) -> PreviewResult<Option<PathBuf>>;
}

/// Production renderer: [`RawFrameCache`] followed by [`RenderInvoker::filter_frame`].
pub struct PreviewPipeline {
    cache: Arc<RawFrameCache>,
    invoker: Arc<RenderInvoker>,
}

impl PreviewPipeline {
    pub fn new(cache: Arc<RawFrameCache>, invoker: Arc<RenderInvoker>) -> Self {
        Self { cache, invoker }
    }

    pub fn cache(&self) -> &Arc<RawFrameCache> {
        &self.cache
    }
}

impl FrameRenderer for PreviewPipeline {
    fn render(&self, request: &RenderRequest, token: &CancelToken) -> PreviewResult<Option<PathBuf>> {
        let raw = self.cache.ensure_raw_frame(request.key, request.source.as_ref())?;
        if token.is_cancelled() {
            debug!("Request {} superseded after raw frame, skipping filter pass", request.id);
            return Ok(None);
        }
        let filtered = self.invoker.filter_frame(&raw, &request.filter_args())?;
        Ok(Some(filtered))
    }
}
