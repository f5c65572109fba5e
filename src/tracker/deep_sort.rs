//! Frame-by-frame tracking loop: predict, cascaded association, track
//! lifecycle maintenance.

use crate::tracker::hungarian::HungarianSolver;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching;
use crate::tracker::rect::Rect;
use crate::tracker::track::Track;
use crate::tracker::track_state::TrackState;

/// Number of `time_since_update` levels the matching cascade visits.
const CASCADE_DEPTH: u32 = 30;

/// Multi-object tracker maintaining a roster of persistently-identified
/// tracks from per-frame bounding box detections.
///
/// Association is purely motion/geometry based: a per-track
/// constant-velocity Kalman filter, a chi-square Mahalanobis gate and a
/// Hungarian assignment, cascaded over confirmation state and
/// time-since-update tiers so recently-seen, confirmed tracks are served
/// first.
pub struct DeepSort {
    tracks: Vec<Track>,
    kalman_filter: KalmanFilter,
    solver: HungarianSolver,
    next_id: u64,
}

impl Default for DeepSort {
    fn default() -> Self {
        Self::new()
    }
}

impl DeepSort {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            kalman_filter: KalmanFilter::new(),
            solver: HungarianSolver::new(),
            next_id: 1,
        }
    }

    /// Current roster of live tracks, in stable (insertion) order.
    ///
    /// The returned borrow is valid until the next call to
    /// [`update`](Self::update).
    pub fn objects(&self) -> &[Track] {
        &self.tracks
    }

    /// Advance the tracker by one frame.
    ///
    /// Every live track is motion-predicted, detections are associated
    /// through the matching cascade, matched tracks are corrected,
    /// missed tracks age out, unmatched detections spawn tentative
    /// tracks and deleted tracks are purged. An empty detection slice is
    /// valid and simply ages all tracks.
    pub fn update(&mut self, detections: &[Rect]) {
        for track in &mut self.tracks {
            track.predict(&self.kalman_filter);
        }

        let mut unmatched_tracks: Vec<usize> = (0..self.tracks.len()).collect();
        let mut unmatched_detections: Vec<usize> = (0..detections.len()).collect();

        // Two passes over the lifecycle states, confirmed tracks first.
        // Within a pass, tracks seen more recently match earlier.
        for state in [TrackState::Confirmed, TrackState::Tentative] {
            for level in 0..CASCADE_DEPTH {
                if unmatched_tracks.is_empty() || unmatched_detections.is_empty() {
                    break;
                }

                let level_tracks: Vec<usize> = unmatched_tracks
                    .iter()
                    .copied()
                    .filter(|&idx| {
                        let track = &self.tracks[idx];
                        track.state() == state && track.time_since_update() == level + 1
                    })
                    .collect();
                if level_tracks.is_empty() {
                    continue;
                }

                let matches = match matching::min_cost_matching(
                    &mut self.solver,
                    &self.kalman_filter,
                    &self.tracks,
                    detections,
                    &level_tracks,
                    &unmatched_detections,
                ) {
                    Ok(matches) => matches,
                    Err(err) => {
                        log::error!("association failed at cascade level {level}: {err}");
                        continue;
                    }
                };

                for &(track_idx, det_idx) in &matches {
                    self.tracks[track_idx].update(&self.kalman_filter, detections[det_idx]);
                    unmatched_tracks.retain(|&idx| idx != track_idx);
                    unmatched_detections.retain(|&idx| idx != det_idx);
                }
            }
        }

        for &track_idx in &unmatched_tracks {
            self.tracks[track_idx].mark_missed();
        }
        for &det_idx in &unmatched_detections {
            self.new_track(detections[det_idx]);
        }
        self.tracks.retain(|track| track.state() != TrackState::Deleted);
    }

    fn new_track(&mut self, detection: Rect) {
        self.tracks
            .push(Track::new(&self.kalman_filter, detection, self.next_id));
        self.next_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_births_get_monotonically_increasing_ids() {
        let mut tracker = DeepSort::new();

        tracker.update(&[Rect::new(0, 0, 40, 80), Rect::new(200, 0, 240, 80)]);
        let mut ids: Vec<u64> = tracker.objects().iter().map(|t| t.id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);

        // The tentative tracks die on the empty frame, but their ids are
        // never reused.
        tracker.update(&[]);
        assert!(tracker.objects().is_empty());

        tracker.update(&[Rect::new(0, 0, 40, 80)]);
        assert_eq!(tracker.objects()[0].id(), 3);
    }

    #[test]
    fn test_empty_frame_ages_tracks() {
        let mut tracker = DeepSort::new();
        for i in 0..3 {
            tracker.update(&[Rect::new(i, 0, 40 + i, 80)]);
        }
        assert!(tracker.objects()[0].is_confirmed());

        tracker.update(&[]);
        assert_eq!(tracker.objects()[0].time_since_update(), 1);
        tracker.update(&[]);
        assert_eq!(tracker.objects()[0].time_since_update(), 2);
    }

    #[test]
    fn test_confirmed_track_is_preferred_over_tentative() {
        let mut tracker = DeepSort::new();

        // Confirm one track, then spawn a tentative one close by.
        for _ in 0..3 {
            tracker.update(&[Rect::new(0, 0, 40, 80)]);
        }
        tracker.update(&[Rect::new(0, 0, 40, 80), Rect::new(60, 0, 100, 80)]);
        assert_eq!(tracker.objects().len(), 2);

        // A single detection between both must go to the confirmed track.
        tracker.update(&[Rect::new(10, 0, 50, 80)]);
        let confirmed: Vec<_> = tracker
            .objects()
            .iter()
            .filter(|t| t.is_confirmed())
            .collect();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].time_since_update(), 0);
        assert_eq!(confirmed[0].last_position(), Rect::new(10, 0, 50, 80));
    }
}
