/// Errors raised by transform stack operations
use std::fmt;

/// A rejected transform operation. The stack, view and projection are left
/// exactly as they were before the failing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// `pop` called with no saved snapshot.
    StackUnderflow,
    /// Rotation axis has zero length.
    InvalidAxis,
    /// Eye equals target, or `up` is parallel to the viewing direction.
    DegenerateCamera,
    /// Zero-volume projection, or a perspective near plane at or behind the eye.
    InvalidFrustum,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::StackUnderflow => write!(f, "pop on an empty transform stack"),
            TransformError::InvalidAxis => write!(f, "rotation axis has zero length"),
            TransformError::DegenerateCamera => {
                write!(f, "camera orientation is undefined (eye on target or up parallel to view)")
            }
            TransformError::InvalidFrustum => write!(f, "projection volume is degenerate or invalid"),
        }
    }
}

impl std::error::Error for TransformError {}
