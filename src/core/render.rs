//! External render tool (ffmpeg) invocation.
//!
//! [`RenderInvoker`] resolves the tool on `PATH`, builds argument vectors for
//! single-frame filtering and full-video encoding, runs the process to
//! completion and turns a non-zero exit into
//! [`PreviewError::ProcessExecutionFailed`] with stderr preserved.

use log::{debug, trace};
use once_cell::sync::OnceCell;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::core::cache_dir::CacheDir;
use crate::core::error::{PreviewError, PreviewResult};

/// Quality/codec settings of the export encode
pub const EXPORT_CRF: &str = "16";
pub const EXPORT_VCODEC: &str = "libx264";
pub const EXPORT_PROFILE: &str = "baseline";
pub const EXPORT_X264_OPTS: &str = "level=3.0";

/// Suffix appended to the source file name for exports
pub const EXPORT_SUFFIX: &str = "-encoded.mp4";

/// Captured result of a successful tool run.
#[derive(Debug, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Wrapper around the render tool executable.
///
/// Resolution is lazy: the first successful lookup is cached, a failed one
/// is retried on the next call so installing the tool fixes a running session.
#[derive(Debug)]
pub struct RenderInvoker {
    tool: String,
    resolved: OnceCell<PathBuf>,
    cache_dir: Arc<CacheDir>,
}

impl RenderInvoker {
    pub fn new(tool: impl Into<String>, cache_dir: Arc<CacheDir>) -> Self {
        Self {
            tool: tool.into(),
            resolved: OnceCell::new(),
            cache_dir,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn cache_dir(&self) -> &Arc<CacheDir> {
        &self.cache_dir
    }

    /// Full path of the tool executable.
    pub fn binary(&self) -> PreviewResult<&Path> {
        self.resolved
            .get_or_try_init(|| {
                let path = which::which(&self.tool)
                    .map_err(|_| PreviewError::binary_not_found(&self.tool))?;
                debug!("Resolved render tool '{}' -> {}", self.tool, path.display());
                Ok(path)
            })
            .map(PathBuf::as_path)
    }

    /// Run the tool with `args` and wait for it. Non-zero exit is an error.
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S]) -> PreviewResult<ToolOutput> {
        let binary = self.binary()?;
        debug!("{} {}", self.tool, display_args(args));

        let start = Instant::now();
        let output = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PreviewError::binary_not_found(&self.tool)
                } else {
                    PreviewError::process_failed(None, format!("failed to spawn {}: {}", self.tool, e))
                }
            })?;
        debug!("{} took {} ms", self.tool, start.elapsed().as_millis());

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(PreviewError::process_failed(output.status.code(), stderr));
        }
        trace!("{} stderr: {}", self.tool, stderr.trim());

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr,
        })
    }

    /// Apply `filter_args` to a raw frame, writing a new time-stamped image
    /// into the cache directory. The output file is not inspected on success.
    pub fn filter_frame(&self, raw_path: &Path, filter_args: &[String]) -> PreviewResult<PathBuf> {
        let out_path = self.cache_dir.join(filtered_frame_name(SystemTime::now()));
        let args = filter_frame_args(raw_path, filter_args, &out_path);
        self.run(&args)?;
        Ok(out_path)
    }

    /// Re-encode `input` with `filter_args` next to the source file.
    pub fn encode(&self, input: &Path, filter_args: &[String]) -> PreviewResult<PathBuf> {
        let out_path = encoded_output_path(input);
        let args = encode_args(input, filter_args, &out_path);
        self.run(&args)?;
        Ok(out_path)
    }
}

/// `frame-filtered-<unix millis>.jpeg`
pub fn filtered_frame_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("frame-filtered-{millis}.jpeg")
}

/// `<dir>/<file name>-encoded.mp4` (the full file name, extension included, is kept).
pub fn encoded_output_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(EXPORT_SUFFIX);
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

pub fn filter_frame_args(raw_path: &Path, filter_args: &[String], out_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), raw_path.into()];
    args.extend(filter_args.iter().map(OsString::from));
    args.extend(["-hide_banner", "-f", "image2", "-y"].map(OsString::from));
    args.push(out_path.into());
    args
}

pub fn encode_args(input: &Path, filter_args: &[String], out_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), input.into(), "-acodec".into(), "copy".into()];
    args.extend(filter_args.iter().map(OsString::from));
    args.extend(
        [
            "-crf",
            EXPORT_CRF,
            "-vcodec",
            EXPORT_VCODEC,
            "-profile:v",
            EXPORT_PROFILE,
            "-x264opts",
            EXPORT_X264_OPTS,
            "-threads",
            "0",
            "-map",
            "0",
            "-y",
        ]
        .map(OsString::from),
    );
    args.push(out_path.into());
    args
}

fn display_args<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
