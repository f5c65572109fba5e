//! Trait for object detection inference backends.

use crate::tracker::Rect;

/// Source of per-frame bounding box detections.
///
/// The tracker is detector-agnostic: anything that can turn a frame into
/// a set of axis-aligned boxes can drive it. Implementations wrap an
/// inference backend and surface its failures through
/// [`DetectionSource::Error`]; the tracking loop never sees anything but
/// the boxes.
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run detection on one frame of raw image data.
    ///
    /// `input` holds the frame bytes in whatever layout the backend
    /// expects for a `width` x `height` image. Returns the detected
    /// boxes in image pixel coordinates.
    fn detect(&mut self, input: &[u8], width: u32, height: u32)
        -> Result<Vec<Rect>, Self::Error>;
}

/// Conversion of backend-specific output into detection boxes.
///
/// Model outputs usually carry confidence scores and class labels that
/// the motion-only association never consumes; implementations decide
/// what to discard before the boxes reach the tracker.
pub trait IntoDetections {
    /// Convert the output into a vector of detected boxes.
    fn into_detections(self) -> Vec<Rect>;
}

impl IntoDetections for Vec<Rect> {
    fn into_detections(self) -> Vec<Rect> {
        self
    }
}
