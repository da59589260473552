//! livegrade - live filter preview for video files
//!
//! Re-exports all modules for use by the binary target.

// Core engine (filters, cache, render invocation, scheduler)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod console;
pub mod runner;
pub mod shell;

// Re-export commonly used types from core
pub use crate::core::error::{PreviewError, PreviewResult};
pub use crate::core::filters::{FilterParam, FilterState};
pub use crate::core::scheduler::PreviewScheduler;
