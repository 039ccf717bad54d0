//! Overlay list validation.
//!
//! Runs synchronously at submission, before a job is ever created. Upper
//! bounds on positions and sizes are deliberately not enforced: overlays
//! may extend past the frame edges and the renderer clips them.

use std::collections::HashSet;

use thiserror::Error;

use crate::overlay::{OverlayDescriptor, OverlayKind};

/// Result type for overlay validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors reported for malformed overlay input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate overlay id '{0}'")]
    DuplicateId(String),

    #[error("overlay '{id}': start_time must be before end_time")]
    InvalidTimeWindow { id: String },

    #[error("overlay '{id}': field '{field}' must be non-negative")]
    NegativeField { id: String, field: &'static str },

    #[error("overlay '{id}': font_size must be positive")]
    ZeroFontSize { id: String },

    #[error("overlay '{id}': text overlays require non-empty content")]
    EmptyText { id: String },

    #[error("overlay '{id}': {kind} overlays require a content reference")]
    MissingContentRef { id: String, kind: &'static str },
}

/// Validate a list of overlay descriptors.
///
/// Pure function; the caller keeps the list in its original order, which
/// the compiler later treats as back-to-front paint order.
pub fn validate_overlays(overlays: &[OverlayDescriptor]) -> ValidationResult<()> {
    let mut seen = HashSet::new();

    for overlay in overlays {
        if !seen.insert(overlay.id.as_str()) {
            return Err(ValidationError::DuplicateId(overlay.id.clone()));
        }

        if !(overlay.start_time < overlay.end_time) {
            return Err(ValidationError::InvalidTimeWindow {
                id: overlay.id.clone(),
            });
        }

        check_non_negative(&overlay.id, "position_x", overlay.position_x)?;
        check_non_negative(&overlay.id, "position_y", overlay.position_y)?;
        if let Some(width) = overlay.width {
            check_non_negative(&overlay.id, "width", width)?;
        }
        if let Some(height) = overlay.height {
            check_non_negative(&overlay.id, "height", height)?;
        }

        if overlay.font_size == Some(0) {
            return Err(ValidationError::ZeroFontSize {
                id: overlay.id.clone(),
            });
        }

        match overlay.kind {
            OverlayKind::Text => {
                if overlay.content.trim().is_empty() {
                    return Err(ValidationError::EmptyText {
                        id: overlay.id.clone(),
                    });
                }
            }
            OverlayKind::Image | OverlayKind::Video => {
                if overlay.content.trim().is_empty() {
                    return Err(ValidationError::MissingContentRef {
                        id: overlay.id.clone(),
                        kind: overlay.kind.as_str(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn check_non_negative(id: &str, field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_nan() || value < 0.0 {
        return Err(ValidationError::NegativeField {
            id: id.to_string(),
            field,
        });
    }
    Ok(())
}
