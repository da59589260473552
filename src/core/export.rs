//! Full-video export with the current filter chain.
//!
//! Runs synchronously on the caller's thread; independent of the preview
//! scheduler (exporting neither cancels nor waits for preview renders).

use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::core::error::PreviewResult;
use crate::core::filters::{FilterState, filter_args};
use crate::core::render::RenderInvoker;

pub struct ExportEncoder {
    invoker: Arc<RenderInvoker>,
}

impl ExportEncoder {
    pub fn new(invoker: Arc<RenderInvoker>) -> Self {
        Self { invoker }
    }

    /// Re-encode `input` to `<dir>/<file name>-encoded.mp4` (H.264 baseline,
    /// CRF 16, audio copied). Returns the output path once the tool exits.
    pub fn export(&self, input: &Path, filters: &FilterState) -> PreviewResult<PathBuf> {
        let args = filter_args(filters);
        info!("Exporting {} ({})", input.display(), describe_filters(&args));
        let start = Instant::now();
        let out = self.invoker.encode(input, &args)?;
        info!(
            "Export finished: {} (took {} ms)",
            out.display(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }
}

fn describe_filters(args: &[String]) -> String {
    match args.get(1) {
        Some(chain) => format!("filters: {chain}"),
        None => "no filters".to_string(),
    }
}
