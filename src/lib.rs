//! Motion-based multi-object tracking.
//!
//! Given a stream of per-frame bounding box detections, the tracker
//! maintains a roster of tracks with stable identifiers that survive
//! short detection gaps and brief occlusions. Each track carries a
//! constant-velocity Kalman filter over center/aspect/height space;
//! detections are associated through a chi-square-gated Hungarian
//! assignment, cascaded over confirmation state and time-since-update
//! so recently-seen, confirmed tracks are served first.
//!
//! The association cost is purely motion and geometry; appearance
//! features are not modeled.
//!
//! # Example
//!
//! ```
//! use deepsort_rs::{DeepSort, Rect};
//!
//! let mut tracker = DeepSort::new();
//! tracker.update(&[Rect::new(10, 10, 50, 90)]);
//!
//! for track in tracker.objects() {
//!     println!("track {} at {:?}", track.id(), track.last_position());
//! }
//! ```

pub mod integration;
pub mod tracker;

pub use integration::{DetectionSource, IntoDetections, TrackerPipeline};
pub use tracker::{DeepSort, Error, Rect, Track, TrackState};
