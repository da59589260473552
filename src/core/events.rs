//! Messages into and out of the preview scheduler.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::filters::FilterState;
use crate::core::source::FrameSource;

/// State change reported by the host (UI, console, tests).
#[derive(Clone)]
pub enum PreviewEvent {
    /// Switch to a new source: resets video state and empties the cache directory.
    LoadSource(Arc<dyn FrameSource>),
    /// Playhead moved. `None` while no position is known.
    SetTime(Option<f64>),
    SetPlaying(bool),
    /// New filter snapshot.
    SetFilters(FilterState),
    Shutdown,
}

impl fmt::Debug for PreviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewEvent::LoadSource(source) => write!(f, "LoadSource({})", source.describe()),
            PreviewEvent::SetTime(t) => write!(f, "SetTime({t:?})"),
            PreviewEvent::SetPlaying(p) => write!(f, "SetPlaying({p})"),
            PreviewEvent::SetFilters(state) => write!(f, "SetFilters({state:?})"),
            PreviewEvent::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Change of displayable state, published only by the scheduler thread.
#[derive(Clone, Debug, PartialEq)]
pub enum PreviewUpdate {
    /// A filtered frame for the latest request is ready.
    FrameReady(PathBuf),
    /// Overlay removed (playback started/stopped, new source).
    FrameCleared,
    /// Latest request failed; payload is the diagnostic text.
    Error(String),
}

/// What the host should currently show on top of the video.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayState {
    pub frame: Option<PathBuf>,
    pub error: Option<String>,
}

/// Scheduler lifecycle, as observed from outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    PendingDebounce,
    Rendering,
    Error,
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerPhase::Idle => write!(f, "idle"),
            SchedulerPhase::PendingDebounce => write!(f, "pending"),
            SchedulerPhase::Rendering => write!(f, "rendering"),
            SchedulerPhase::Error => write!(f, "error"),
        }
    }
}
