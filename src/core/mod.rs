//! Core engine modules - filters, frame cache, render invocation, scheduler
//!
//! These modules form the preview engine, independent of any UI.

pub mod cache_dir;
pub mod cancel;
pub mod debounce;
pub mod error;
pub mod events;
pub mod export;
pub mod filters;
pub mod frame_cache;
pub mod pipeline;
pub mod render;
pub mod scheduler;
pub mod source;
pub mod workers;

// Re-exports for convenience
pub use cache_dir::CacheDir;
pub use cancel::CancelToken;
pub use debounce::Debouncer;
pub use error::{PreviewError, PreviewResult};
pub use events::{DisplayState, PreviewEvent, PreviewUpdate, SchedulerPhase};
pub use export::ExportEncoder;
pub use filters::{FilterParam, FilterState, filter_args, filter_chain};
pub use frame_cache::{CacheStats, RawFrameCache, RawFrameKey};
pub use pipeline::{FrameRenderer, PreviewPipeline, RenderRequest};
pub use render::RenderInvoker;
pub use scheduler::{PreviewScheduler, SchedulerConfig};
pub use source::{FfmpegFrameSource, FrameSource};
pub use workers::Workers;
