//! Video sources that can hand out the decoded frame at a timeline position.

use log::{debug, warn};
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use crate::core::error::{PreviewError, PreviewResult};
use crate::core::render::RenderInvoker;

/// Something that can produce an encoded still (JPEG) of the frame shown at `timestamp`.
///
/// An empty buffer means nothing could be captured; callers treat that as
/// [`PreviewError::NoFrameCaptured`](crate::core::error::PreviewError::NoFrameCaptured).
pub trait FrameSource: Send + Sync {
    fn capture(&self, timestamp: f64) -> PreviewResult<Vec<u8>>;

    /// Media duration in seconds, if known.
    fn duration(&self) -> Option<f64> {
        None
    }

    /// Human-readable label for logs.
    fn describe(&self) -> String {
        String::from("<frame source>")
    }
}

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid duration regex")
});

/// Parse `Duration: HH:MM:SS.ss` from the tool's stream banner.
pub fn parse_duration(banner: &str) -> Option<f64> {
    let caps = DURATION_RE.captures(banner)?;
    let h: f64 = caps[1].parse().ok()?;
    let m: f64 = caps[2].parse().ok()?;
    let s: f64 = caps[3].parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

/// File-backed source decoded by the render tool itself.
pub struct FfmpegFrameSource {
    path: PathBuf,
    invoker: Arc<RenderInvoker>,
    /// mjpeg `-q:v` (2 = best, 31 = worst)
    quality: u8,
    duration: Option<f64>,
}

impl FfmpegFrameSource {
    /// Open `path`, probing its duration from the tool's banner.
    pub fn open(path: impl Into<PathBuf>, invoker: Arc<RenderInvoker>, quality: u8) -> Self {
        let path = path.into();
        let duration = probe_duration(&invoker, &path);
        match duration {
            Some(d) => debug!("Source {} duration {:.3}s", path.display(), d),
            None => warn!("Could not determine duration of {}", path.display()),
        }
        Self {
            path,
            invoker,
            quality: quality.clamp(2, 31),
            duration,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `-i <file>` without an output always exits non-zero; the banner is in stderr either way.
fn probe_duration(invoker: &RenderInvoker, path: &Path) -> Option<f64> {
    let args = [OsStr::new("-hide_banner"), OsStr::new("-i"), path.as_os_str()];
    let banner = match invoker.run(&args) {
        Ok(out) => out.stderr,
        Err(PreviewError::ProcessExecutionFailed { stderr, .. }) => stderr,
        Err(e) => {
            debug!("Duration probe failed: {}", e);
            return None;
        }
    };
    parse_duration(&banner)
}

impl FrameSource for FfmpegFrameSource {
    fn capture(&self, timestamp: f64) -> PreviewResult<Vec<u8>> {
        let start = Instant::now();
        let ts = format!("{:.3}", timestamp.max(0.0));
        let q = self.quality.to_string();
        let mut args: Vec<OsString> = ["-hide_banner", "-ss", ts.as_str(), "-i"]
            .map(OsString::from)
            .to_vec();
        args.push(self.path.clone().into_os_string());
        args.extend(
            ["-frames:v", "1", "-f", "image2", "-c:v", "mjpeg", "-q:v", q.as_str(), "pipe:1"]
                .map(OsString::from),
        );
        let out = self.invoker.run(&args)?;
        debug!(
            "capture frame took {} ms ({} bytes)",
            start.elapsed().as_millis(),
            out.stdout.len()
        );
        Ok(out.stdout)
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
