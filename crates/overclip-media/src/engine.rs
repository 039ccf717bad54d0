//! Render engine boundary.
//!
//! The executor talks to the external renderer only through
//! [`RenderEngine`], so tests substitute a fake engine and production wires
//! in [`FfmpegEngine`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::filter::TERMINAL_LABEL;
use crate::probe::{probe_video, VideoInfo};

/// Everything one render invocation needs.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Source video path (ffmpeg input 0)
    pub source: PathBuf,
    /// Auxiliary media paths, in filter graph registration order
    pub aux_inputs: Vec<PathBuf>,
    /// Serialized filter graph, `None` for pass-through
    pub filter_complex: Option<String>,
    /// Output file path
    pub output: PathBuf,
}

/// Black-box renderer the executor drives.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Inspect a source video for frame size and duration.
    async fn probe(&self, input: &Path) -> MediaResult<VideoInfo>;

    /// Render the request to its output path, or fail with the renderer's
    /// diagnostic output.
    async fn render(&self, request: &RenderRequest) -> MediaResult<()>;
}

/// Production engine shelling out to ffmpeg/ffprobe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegEngine;

impl FfmpegEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderEngine for FfmpegEngine {
    async fn probe(&self, input: &Path) -> MediaResult<VideoInfo> {
        probe_video(input).await
    }

    async fn render(&self, request: &RenderRequest) -> MediaResult<()> {
        let mut cmd = FfmpegCommand::new(&request.source, &request.output);
        for aux in &request.aux_inputs {
            cmd = cmd.aux_input(aux);
        }

        cmd = match &request.filter_complex {
            Some(filter) => cmd
                .filter_complex(filter.clone())
                .map(format!("[{}]", TERMINAL_LABEL))
                // Audio is carried through untouched; mixing is out of scope.
                .map("0:a?")
                .video_codec("libx264")
                .preset("medium")
                .audio_codec("copy"),
            None => cmd.video_codec("copy").audio_codec("copy"),
        };

        info!(
            output = %request.output.display(),
            aux_inputs = request.aux_inputs.len(),
            "Rendering with ffmpeg"
        );
        cmd.run().await
    }
}
