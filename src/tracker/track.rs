//! Single tracked object: Kalman state, lifecycle counters and the
//! bounded history of observed boxes.

use std::collections::VecDeque;

use ndarray::{Array1, Array2};

use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Maximum number of past observations kept per track.
const TRACE_CAP: usize = 80;

/// Width of the centered moving average applied by [`Track::trace_line`].
const SMOOTH_WINDOW: usize = 5;

/// Updates required before a tentative track is confirmed.
const HITS_TO_CONFIRM: u32 = 3;

/// A confirmed track is deleted once `time_since_update` exceeds this.
const MAX_AGE: u32 = 30;

/// A single tracked object.
///
/// Owned exclusively by the tracker; callers only see shared borrows,
/// valid until the next tracker update.
#[derive(Debug, Clone)]
pub struct Track {
    id: u64,
    state: TrackState,
    hits: u32,
    age: u32,
    time_since_update: u32,
    mean: Array1<f32>,
    covariance: Array2<f32>,
    last_position: Rect,
    trace: VecDeque<Rect>,
}

impl Track {
    /// Create a tentative track from an unmatched detection, seeding the
    /// filter state from the measurement.
    pub(crate) fn new(kf: &KalmanFilter, detection: Rect, id: u64) -> Self {
        let (mean, covariance) = kf.initiate(detection.to_xyah());
        let mut trace = VecDeque::new();
        trace.push_back(detection);

        Self {
            id,
            state: TrackState::Tentative,
            hits: 1,
            age: 1,
            time_since_update: 0,
            mean,
            covariance,
            last_position: detection,
            trace,
        }
    }

    /// Propagate the state one frame forward.
    pub(crate) fn predict(&mut self, kf: &KalmanFilter) {
        let (mean, covariance) = kf.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.age += 1;
        self.time_since_update += 1;
    }

    /// Fold an associated detection into the track.
    pub(crate) fn update(&mut self, kf: &KalmanFilter, detection: Rect) {
        self.trace.push_back(detection);
        if self.trace.len() > TRACE_CAP {
            self.trace.pop_front();
        }

        // A singular innovation covariance leaves the predicted state in
        // place; the observation still counts toward the lifecycle.
        if let Some((mean, covariance)) = kf.update(&self.mean, &self.covariance, detection.to_xyah())
        {
            self.mean = mean;
            self.covariance = covariance;
        }

        self.last_position = detection;
        self.hits += 1;
        self.time_since_update = 0;

        if self.state == TrackState::Tentative && self.hits >= HITS_TO_CONFIRM {
            self.state = TrackState::Confirmed;
        }
    }

    /// Mark this track as missed (no association at the current frame).
    pub(crate) fn mark_missed(&mut self) {
        if self.state == TrackState::Tentative || self.time_since_update > MAX_AGE {
            self.state = TrackState::Deleted;
        }
    }

    #[inline]
    pub(crate) fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    #[inline]
    pub(crate) fn covariance(&self) -> &Array2<f32> {
        &self.covariance
    }

    /// Stable track identifier, assigned once at birth.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Whether the track has been confirmed.
    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Frames elapsed since the last successful update.
    #[inline]
    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    /// The most recent observed box.
    #[inline]
    pub fn last_position(&self) -> Rect {
        self.last_position
    }

    /// Number of observations in the history trail.
    #[inline]
    pub fn trace_size(&self) -> usize {
        self.trace.len()
    }

    /// Bounding box derived from the current (motion-predicted) mean,
    /// truncated to integer pixels.
    pub fn predict_box(&self) -> Rect {
        Rect::from_xyah(self.mean[0], self.mean[1], self.mean[2], self.mean[3])
    }

    /// The `k`-th most recent observation, `0` being the newest.
    ///
    /// An out-of-range index is logged and yields the empty sentinel box.
    pub fn location(&self, k: usize) -> Rect {
        if k >= self.trace.len() {
            log::warn!(
                "history index {k} out of range ({} entries) for track {}",
                self.trace.len(),
                self.id
            );
            return Rect::default();
        }
        self.trace[self.trace.len() - 1 - k]
    }

    /// Smoothed polyline over the observation history.
    ///
    /// Each point is a centered moving average over up to `SMOOTH_WINDOW`
    /// observations; x follows the box centers, y follows the box bottoms
    /// as a ground-contact approximation. Read-only projection.
    pub fn trace_line(&self) -> Vec<(i32, i32)> {
        let count = self.trace.len();
        let mut line = Vec::with_capacity(count);
        for i in 0..count {
            let begin = i.saturating_sub(SMOOTH_WINDOW / 2);
            let end = (i + SMOOTH_WINDOW / 2 + 1).min(count);
            let mut x = 0;
            let mut y = 0;
            for rect in self.trace.range(begin..end) {
                x += rect.center().0;
                y += rect.bottom;
            }
            let n = (end - begin) as i32;
            line.push((x / n, y / n));
        }
        line
    }
}
