//! FFmpeg CLI wrapper for overlay rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - FFprobe-based source inspection
//! - The overlay filter graph compiler and its `-filter_complex` serializer
//! - The [`RenderEngine`] boundary trait with the ffmpeg-backed implementation

pub mod command;
pub mod engine;
pub mod error;
pub mod filter;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand};
pub use engine::{FfmpegEngine, RenderEngine, RenderRequest};
pub use error::{MediaError, MediaResult};
pub use filter::{compile_overlays, FilterGraph, FilterNode, FilterOp, SOURCE_LABEL, TERMINAL_LABEL};
pub use probe::{probe_video, VideoInfo};
