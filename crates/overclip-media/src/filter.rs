//! Overlay filter graph compilation.
//!
//! Turns a validated overlay list plus the source frame size into an
//! ordered sequence of filter nodes wired together by stream labels, and
//! serializes that sequence into an FFmpeg `-filter_complex` expression.
//!
//! Overlays are processed in input order: later overlays composite on top
//! of earlier ones, matching back-to-front paint order. The compiler keeps
//! a running "current stream" label that starts at the source video and
//! advances through every emitted node, so the labels always form a single
//! connected chain ending at [`TERMINAL_LABEL`].

use overclip_models::{OverlayDescriptor, OverlayKind};

/// Stream label of the source video (ffmpeg input 0).
pub const SOURCE_LABEL: &str = "0:v";

/// Stream label of the terminal output, mapped into the output file.
pub const TERMINAL_LABEL: &str = "vout";

/// Default font size for text overlays.
const DEFAULT_FONT_SIZE: u32 = 24;

/// Default font color for text overlays.
const DEFAULT_FONT_COLOR: &str = "white";

/// Default width/height fraction for image/video overlays.
const DEFAULT_SCALE_FRACTION: f64 = 0.2;

/// One rendering operation in the compiled graph.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Draw text onto the incoming stream.
    DrawText {
        /// Escaped text content
        text: String,
        /// Pixel position
        x: i64,
        y: i64,
        font_size: u32,
        font_color: String,
        /// Visibility window in seconds
        start: f64,
        end: f64,
    },
    /// Scale an auxiliary input to pixel dimensions.
    Scale { width: u32, height: u32 },
    /// Composite a scaled auxiliary stream onto the incoming stream.
    Overlay {
        x: i64,
        y: i64,
        start: f64,
        end: f64,
    },
}

impl FilterOp {
    /// Evaluate the timed-visibility predicate at `t` seconds.
    ///
    /// `None` for operations without a time window (scaling).
    pub fn enabled_at(&self, t: f64) -> Option<bool> {
        match self {
            FilterOp::DrawText { start, end, .. } | FilterOp::Overlay { start, end, .. } => {
                Some(t >= *start && t < *end)
            }
            FilterOp::Scale { .. } => None,
        }
    }

    /// Render the operation as a single filter stage (labels excluded).
    fn render(&self) -> String {
        match self {
            FilterOp::DrawText {
                text,
                x,
                y,
                font_size,
                font_color,
                start,
                end,
            } => format!(
                "drawtext=text='{}':fontsize={}:fontcolor={}:x={}:y={}:enable='between(t,{},{})'",
                text, font_size, font_color, x, y, start, end
            ),
            FilterOp::Scale { width, height } => format!("scale={}:{}", width, height),
            FilterOp::Overlay { x, y, start, end } => format!(
                "overlay={}:{}:enable='between(t,{},{})'",
                x, y, start, end
            ),
        }
    }
}

/// One node of the compiled graph: an operation plus its label wiring.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub op: FilterOp,
    /// Input stream labels, in filter argument order
    pub inputs: Vec<String>,
    /// Freshly allocated output stream label
    pub output: String,
}

/// The compiled graph: nodes, auxiliary inputs, and the terminal label.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    /// Nodes in emission order
    pub nodes: Vec<FilterNode>,
    /// Content refs the renderer must load as extra inputs, in index order.
    /// The i-th ref becomes ffmpeg input `i + 1`.
    pub aux_inputs: Vec<String>,
    /// Label of the final video stream
    pub output: String,
}

impl FilterGraph {
    /// True when no overlay produced a node (source passes through).
    pub fn is_pass_through(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize into an FFmpeg `-filter_complex` expression.
    ///
    /// One node becomes one filter stage; stages are joined with `;` and
    /// wired by the node labels. `None` for the pass-through graph.
    pub fn to_filter_complex(&self) -> Option<String> {
        if self.nodes.is_empty() {
            return None;
        }

        let stages: Vec<String> = self
            .nodes
            .iter()
            .map(|node| {
                let inputs: String = node
                    .inputs
                    .iter()
                    .map(|label| format!("[{}]", label))
                    .collect();
                format!("{}{}[{}]", inputs, node.op.render(), node.output)
            })
            .collect();

        Some(stages.join(";"))
    }
}

/// Compile `(source_width, source_height, overlays)` into a filter graph.
///
/// Pure given validated input; time windows outside the source duration
/// compile normally and simply never become visible. Overlapping overlays
/// compose via paint order with no collision detection.
pub fn compile_overlays(
    source_width: u32,
    source_height: u32,
    overlays: &[OverlayDescriptor],
) -> FilterGraph {
    let mut nodes = Vec::new();
    let mut aux_inputs = Vec::new();
    let mut labels = LabelAllocator::default();
    let mut current = SOURCE_LABEL.to_string();

    for overlay in overlays {
        let x = to_pixels(overlay.position_x, source_width);
        let y = to_pixels(overlay.position_y, source_height);

        match overlay.kind {
            OverlayKind::Text => {
                let output = labels.fresh();
                nodes.push(FilterNode {
                    op: FilterOp::DrawText {
                        text: escape_drawtext(&overlay.content),
                        x,
                        y,
                        font_size: overlay.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                        font_color: overlay
                            .font_color
                            .clone()
                            .unwrap_or_else(|| DEFAULT_FONT_COLOR.to_string()),
                        start: overlay.start_time,
                        end: overlay.end_time,
                    },
                    inputs: vec![current],
                    output: output.clone(),
                });
                current = output;
            }
            OverlayKind::Image | OverlayKind::Video => {
                // Input index = count of auxiliary inputs registered so far;
                // the source occupies input 0.
                let aux_index = aux_inputs.len();
                aux_inputs.push(overlay.content.clone());

                let scaled = format!("s{}", aux_index);
                nodes.push(FilterNode {
                    op: FilterOp::Scale {
                        width: scale_pixels(overlay.width, source_width),
                        height: scale_pixels(overlay.height, source_height),
                    },
                    inputs: vec![format!("{}:v", aux_index + 1)],
                    output: scaled.clone(),
                });

                let output = labels.fresh();
                nodes.push(FilterNode {
                    op: FilterOp::Overlay {
                        x,
                        y,
                        start: overlay.start_time,
                        end: overlay.end_time,
                    },
                    inputs: vec![current, scaled],
                    output: output.clone(),
                });
                current = output;
            }
        }
    }

    // Relabel the final output so the render mapping is stable.
    let output = if let Some(last) = nodes.last_mut() {
        last.output = TERMINAL_LABEL.to_string();
        TERMINAL_LABEL.to_string()
    } else {
        current
    };

    FilterGraph {
        nodes,
        aux_inputs,
        output,
    }
}

/// Monotonic allocator for intermediate chain labels (`v1`, `v2`, ...).
#[derive(Debug, Default)]
struct LabelAllocator {
    next: usize,
}

impl LabelAllocator {
    fn fresh(&mut self) -> String {
        self.next += 1;
        format!("v{}", self.next)
    }
}

/// Convert a frame-fraction coordinate to pixels.
fn to_pixels(fraction: f64, dimension: u32) -> i64 {
    (fraction * f64::from(dimension)).round() as i64
}

/// Resolve an optional fractional size to pixels, defaulting to 20% of frame.
fn scale_pixels(fraction: Option<f64>, dimension: u32) -> u32 {
    let fraction = fraction.unwrap_or(DEFAULT_SCALE_FRACTION);
    (fraction * f64::from(dimension)).round() as u32
}

/// Escape the characters FFmpeg's filter syntax reserves inside a quoted
/// drawtext value. Centralized here so no caller builds filter text by hand.
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            ':' => escaped.push_str("\\:"),
            '%' => escaped.push_str("\\%"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use overclip_models::OverlayKind;
    use std::collections::HashSet;

    fn overlay(id: &str, kind: OverlayKind, content: &str) -> OverlayDescriptor {
        OverlayDescriptor {
            id: id.to_string(),
            kind,
            content: content.to_string(),
            position_x: 0.5,
            position_y: 0.25,
            start_time: 1.0,
            end_time: 4.0,
            width: None,
            height: None,
            font_size: None,
            font_color: None,
        }
    }

    /// Walk the chain and assert labels form one connected path with no
    /// dangling or duplicate labels.
    fn assert_single_chain(graph: &FilterGraph) {
        let mut current = SOURCE_LABEL.to_string();
        let mut seen_outputs = HashSet::new();
        let mut pending_scaled: Option<String> = None;

        for node in &graph.nodes {
            assert!(
                seen_outputs.insert(node.output.clone()),
                "duplicate output label {}",
                node.output
            );
            match &node.op {
                FilterOp::Scale { .. } => {
                    assert_eq!(node.inputs.len(), 1);
                    assert!(node.inputs[0].ends_with(":v"));
                    pending_scaled = Some(node.output.clone());
                }
                FilterOp::DrawText { .. } => {
                    assert_eq!(node.inputs, vec![current.clone()]);
                    current = node.output.clone();
                }
                FilterOp::Overlay { .. } => {
                    let scaled = pending_scaled.take().expect("overlay without scale");
                    assert_eq!(node.inputs, vec![current.clone(), scaled]);
                    current = node.output.clone();
                }
            }
        }

        assert!(pending_scaled.is_none(), "dangling scaled stream");
        assert_eq!(current, graph.output);
    }

    #[test]
    fn test_zero_overlays_pass_through() {
        let graph = compile_overlays(1920, 1080, &[]);
        assert!(graph.is_pass_through());
        assert_eq!(graph.output, SOURCE_LABEL);
        assert!(graph.aux_inputs.is_empty());
        assert_eq!(graph.to_filter_complex(), None);
    }

    #[test]
    fn test_single_text_overlay() {
        let graph = compile_overlays(1920, 1080, &[overlay("a", OverlayKind::Text, "Hello")]);

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.output, TERMINAL_LABEL);
        assert_single_chain(&graph);

        let expr = graph.to_filter_complex().unwrap();
        assert_eq!(
            expr,
            "[0:v]drawtext=text='Hello':fontsize=24:fontcolor=white:\
             x=960:y=270:enable='between(t,1,4)'[vout]"
        );
    }

    #[test]
    fn test_text_defaults_overridden() {
        let mut over = overlay("a", OverlayKind::Text, "Hi");
        over.font_size = Some(48);
        over.font_color = Some("red".to_string());

        let graph = compile_overlays(100, 100, &[over]);
        let expr = graph.to_filter_complex().unwrap();
        assert!(expr.contains("fontsize=48"));
        assert!(expr.contains("fontcolor=red"));
    }

    #[test]
    fn test_image_overlay_emits_scale_then_overlay() {
        let mut over = overlay("img", OverlayKind::Image, "overlays/logo.png");
        over.width = Some(0.5);
        over.height = Some(0.25);

        let graph = compile_overlays(1920, 1080, &[over]);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.aux_inputs, vec!["overlays/logo.png".to_string()]);
        assert_single_chain(&graph);

        let expr = graph.to_filter_complex().unwrap();
        assert_eq!(
            expr,
            "[1:v]scale=960:270[s0];\
             [0:v][s0]overlay=960:270:enable='between(t,1,4)'[vout]"
        );
    }

    #[test]
    fn test_image_default_scale_is_fifth_of_frame() {
        let graph = compile_overlays(
            1000,
            500,
            &[overlay("img", OverlayKind::Image, "overlays/a.png")],
        );

        match &graph.nodes[0].op {
            FilterOp::Scale { width, height } => {
                assert_eq!(*width, 200);
                assert_eq!(*height, 100);
            }
            other => panic!("expected scale, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_overlays_chain_in_input_order() {
        let overlays = vec![
            overlay("t1", OverlayKind::Text, "one"),
            overlay("i1", OverlayKind::Image, "overlays/a.png"),
            overlay("v1", OverlayKind::Video, "overlays/b.mp4"),
            overlay("t2", OverlayKind::Text, "two"),
        ];

        let graph = compile_overlays(1280, 720, &overlays);
        // text, scale+overlay, scale+overlay, text
        assert_eq!(graph.nodes.len(), 6);
        assert_eq!(
            graph.aux_inputs,
            vec!["overlays/a.png".to_string(), "overlays/b.mp4".to_string()]
        );
        assert_single_chain(&graph);

        // Auxiliary inputs are numbered after the source input.
        assert_eq!(graph.nodes[1].inputs, vec!["1:v".to_string()]);
        assert_eq!(graph.nodes[3].inputs, vec!["2:v".to_string()]);
    }

    #[test]
    fn test_chained_aux_labels_stay_monotonic() {
        // Two image overlays must not reuse or patch intermediate labels.
        let overlays = vec![
            overlay("a", OverlayKind::Image, "overlays/a.png"),
            overlay("b", OverlayKind::Image, "overlays/b.png"),
        ];

        let graph = compile_overlays(640, 480, &overlays);
        let expr = graph.to_filter_complex().unwrap();
        assert!(expr.contains("[s0]"));
        assert!(expr.contains("[s1]"));
        assert!(expr.contains("[v1]"));
        assert!(expr.ends_with("[vout]"));
        assert_single_chain(&graph);
    }

    #[test]
    fn test_visibility_predicate() {
        let over = overlay("a", OverlayKind::Text, "Hi");
        let graph = compile_overlays(100, 100, &[over]);
        let op = &graph.nodes[0].op;

        let mid = (1.0 + 4.0) / 2.0;
        assert_eq!(op.enabled_at(mid), Some(true));
        assert_eq!(op.enabled_at(4.0 + 1.0), Some(false));
    }

    #[test]
    fn test_out_of_range_window_compiles() {
        let mut over = overlay("late", OverlayKind::Text, "never seen");
        over.start_time = 900.0;
        over.end_time = 1000.0;

        let graph = compile_overlays(100, 100, &[over]);
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].op.enabled_at(5.0), Some(false));
    }

    #[test]
    fn test_drawtext_escaping() {
        assert_eq!(escape_drawtext("it's 50%: a\\b"), "it\\'s 50\\%\\: a\\\\b");

        let over = overlay("a", OverlayKind::Text, "3:45 isn't late");
        let graph = compile_overlays(100, 100, &[over]);
        let expr = graph.to_filter_complex().unwrap();
        assert!(expr.contains("text='3\\:45 isn\\'t late'"));
    }

    #[test]
    fn test_positions_round_to_nearest_pixel() {
        let mut over = overlay("a", OverlayKind::Text, "Hi");
        over.position_x = 0.333;
        over.position_y = 0.666;

        let graph = compile_overlays(100, 100, &[over]);
        match &graph.nodes[0].op {
            FilterOp::DrawText { x, y, .. } => {
                assert_eq!(*x, 33);
                assert_eq!(*y, 67);
            }
            other => panic!("expected drawtext, got {:?}", other),
        }
    }

    #[test]
    fn test_positions_may_exceed_frame() {
        let mut over = overlay("a", OverlayKind::Text, "offscreen");
        over.position_x = 1.5;

        let graph = compile_overlays(200, 200, &[over]);
        match &graph.nodes[0].op {
            FilterOp::DrawText { x, .. } => assert_eq!(*x, 300),
            other => panic!("expected drawtext, got {:?}", other),
        }
    }
}
