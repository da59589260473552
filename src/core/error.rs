//! Error taxonomy for the preview pipeline and export path.
//!
//! Every variant is `Clone` so one captured result can be handed to all
//! callers waiting on the same in-flight raw frame (see `frame_cache`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type PreviewResult<T> = Result<T, PreviewError>;

#[derive(thiserror::Error, Debug, Clone)]
pub enum PreviewError {
    /// Render tool is not on the execution search path.
    #[error("render tool '{tool}' not found on PATH")]
    BinaryNotFound { tool: String },

    /// Frame capture returned zero bytes.
    #[error("no frame captured at {timestamp:.3}s")]
    NoFrameCaptured { timestamp: f64 },

    /// Render tool ran and exited unsuccessfully. `exit_code` is `None` when
    /// the process was terminated by a signal or could not be started.
    #[error("render tool failed (exit code {}): {}", fmt_exit_code(.exit_code), .stderr.trim())]
    ProcessExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A render job panicked before producing a result.
    #[error("render job panicked: {message}")]
    RenderPanicked { message: String },

    #[error("file system error at '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
}

fn fmt_exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl PreviewError {
    pub fn binary_not_found(tool: impl Into<String>) -> Self {
        Self::BinaryNotFound { tool: tool.into() }
    }

    pub fn process_failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::ProcessExecutionFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn fs(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.as_ref().to_path_buf(),
            source: Arc::new(source),
        }
    }

    /// Build from a `catch_unwind` payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::RenderPanicked { message }
    }

    /// Text to show the user. Process failures surface the tool's stderr verbatim.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::ProcessExecutionFailed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}
