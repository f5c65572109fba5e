//! TrackerPipeline for combining detection with tracking.

use crate::tracker::{DeepSort, Track};

use super::DetectionSource;

/// A combined tracker that bundles detection inference with the
/// tracking loop.
///
/// This struct provides a convenient way to run end-to-end tracking by
/// combining any [`DetectionSource`] with a [`DeepSort`] tracker.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: DeepSort,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline around the given detector.
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            tracker: DeepSort::new(),
        }
    }

    /// Process a single frame and return the updated roster.
    ///
    /// Runs detection on the input image, then advances the tracker by
    /// one frame with the detected boxes. The returned borrow is valid
    /// until the next frame is processed.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<&[Track], D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        self.tracker.update(&detections);
        Ok(self.tracker.objects())
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &DeepSort {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut DeepSort {
        &mut self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Rect;

    struct MockDetector {
        detections: Vec<Rect>,
    }

    impl DetectionSource for MockDetector {
        type Error = std::convert::Infallible;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Rect>, Self::Error> {
            Ok(self.detections.clone())
        }
    }

    #[test]
    fn test_tracker_pipeline() {
        let detector = MockDetector {
            detections: vec![Rect::new(10, 20, 50, 80)],
        };

        let mut pipeline = TrackerPipeline::new(detector);
        for _ in 0..3 {
            let tracks = pipeline.process_frame(&[], 640, 480).unwrap();
            assert_eq!(tracks.len(), 1);
        }

        // Three identical frames confirm the track.
        assert!(pipeline.tracker().objects()[0].is_confirmed());
    }
}
