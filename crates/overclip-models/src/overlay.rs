//! Overlay descriptors.
//!
//! An overlay is a timed, positioned piece of content (text, image, or a
//! video clip) composited onto the source video. Positions and sizes are
//! fractions of the source frame so the same descriptor is portable across
//! resolutions; times are seconds in the source timeline.

use serde::{Deserialize, Serialize};

/// Kind of overlay content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    /// Literal text drawn onto the frame
    Text,
    /// Still image referenced by blob key
    Image,
    /// Video clip referenced by blob key
    Video,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Text => "text",
            OverlayKind::Image => "image",
            OverlayKind::Video => "video",
        }
    }

    /// Whether this kind needs an auxiliary input loaded by the renderer.
    pub fn needs_aux_input(&self) -> bool {
        matches!(self, OverlayKind::Image | OverlayKind::Video)
    }
}

/// One timed, positioned overlay on the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDescriptor {
    /// Unique within a job
    pub id: String,

    /// Content kind
    #[serde(rename = "type")]
    pub kind: OverlayKind,

    /// Literal text for [`OverlayKind::Text`], blob key otherwise
    pub content: String,

    /// Horizontal position as a fraction of frame width
    pub position_x: f64,

    /// Vertical position as a fraction of frame height
    pub position_y: f64,

    /// Time the overlay becomes visible (seconds)
    pub start_time: f64,

    /// Time the overlay disappears (seconds, exclusive)
    pub end_time: f64,

    /// Width as a fraction of frame width (image/video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Height as a fraction of frame height (image/video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Font size in points (text only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,

    /// Font color name or hex string (text only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
}

impl OverlayDescriptor {
    /// Whether the overlay is visible at `t` seconds.
    ///
    /// Visible iff `start_time <= t < end_time`. An overlay whose window
    /// lies entirely outside the source duration is simply never visible.
    pub fn visible_at(&self, t: f64) -> bool {
        t >= self.start_time && t < self.end_time
    }
}
