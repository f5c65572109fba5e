//! Gated cost construction and detection-to-track association.

use ndarray::Array2;

use crate::tracker::error::Error;
use crate::tracker::hungarian::HungarianSolver;
use crate::tracker::kalman_filter::{KalmanFilter, CHI2INV95};
use crate::tracker::rect::Rect;
use crate::tracker::track::Track;

/// Cost assigned to pairs whose Mahalanobis distance fails the
/// chi-square gate. Far above the acceptance ceiling, so gated pairs are
/// never accepted regardless of the rest of the assignment.
pub const GATED_COST: f64 = 1e5;

/// Assigned pairs with a center distance at or above this many pixels
/// are rejected.
pub const MAX_MATCH_DISTANCE: f64 = 200.0;

/// Accepted `(track index, detection index)` pairs, indexing into the
/// caller's full track and detection slices.
pub type Matches = Vec<(usize, usize)>;

/// Run one round of minimum-cost association between the given track and
/// detection subsets.
///
/// The pairwise cost is the Euclidean distance in pixels between the
/// track's last observed box and the detection, with pairs failing the
/// Mahalanobis gate pushed to [`GATED_COST`]. Assigned pairs at or above
/// [`MAX_MATCH_DISTANCE`] are dropped; their tracks and detections stay
/// unmatched.
pub fn min_cost_matching(
    solver: &mut HungarianSolver,
    kf: &KalmanFilter,
    tracks: &[Track],
    detections: &[Rect],
    track_indices: &[usize],
    detection_indices: &[usize],
) -> Result<Matches, Error> {
    let mut cost_matrix = Array2::zeros((track_indices.len(), detection_indices.len()));
    for (row, &track_idx) in track_indices.iter().enumerate() {
        let track = &tracks[track_idx];
        for (col, &det_idx) in detection_indices.iter().enumerate() {
            let detection = detections[det_idx];
            let maha = kf.gating_distance(
                track.mean(),
                track.covariance(),
                detection.to_xyah(),
                false,
            )?;

            cost_matrix[[row, col]] = if maha > CHI2INV95[3] {
                GATED_COST
            } else {
                f64::from(track.last_position().center_distance(&detection))
            };
        }
    }

    let assignment = solver.solve(&cost_matrix)?;
    log::trace!(
        "assignment over {} tracks x {} detections, total cost {:.1}",
        track_indices.len(),
        detection_indices.len(),
        assignment.cost
    );

    let mut matches = Vec::new();
    for (row, assigned) in assignment.row_to_col.iter().enumerate() {
        let Some(col) = *assigned else {
            continue;
        };
        if cost_matrix[[row, col]] < MAX_MATCH_DISTANCE {
            matches.push((track_indices[row], detection_indices[col]));
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks_at(kf: &KalmanFilter, rects: &[Rect]) -> Vec<Track> {
        rects
            .iter()
            .enumerate()
            .map(|(i, &rect)| Track::new(kf, rect, i as u64 + 1))
            .collect()
    }

    #[test]
    fn test_nearby_detection_matches() {
        let kf = KalmanFilter::new();
        let tracks = tracks_at(&kf, &[Rect::new(10, 10, 50, 90)]);
        let detections = [Rect::new(12, 11, 52, 91)];

        let mut solver = HungarianSolver::new();
        let matches = min_cost_matching(&mut solver, &kf, &tracks, &detections, &[0], &[0]).unwrap();
        assert_eq!(matches, vec![(0, 0)]);
    }

    #[test]
    fn test_gated_pair_is_never_accepted() {
        let kf = KalmanFilter::new();
        let tracks = tracks_at(&kf, &[Rect::new(10, 10, 50, 90)]);
        // Far enough that the chi-square gate fails despite the matrix
        // having no alternative assignment.
        let detections = [Rect::new(900, 900, 940, 980)];

        let mut solver = HungarianSolver::new();
        let matches = min_cost_matching(&mut solver, &kf, &tracks, &detections, &[0], &[0]).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_each_track_gets_its_closer_detection() {
        let kf = KalmanFilter::new();
        let tracks = tracks_at(
            &kf,
            &[Rect::new(0, 0, 40, 80), Rect::new(100, 0, 140, 80)],
        );
        let detections = [Rect::new(102, 0, 142, 80), Rect::new(2, 0, 42, 80)];

        let mut solver = HungarianSolver::new();
        let matches =
            min_cost_matching(&mut solver, &kf, &tracks, &detections, &[0, 1], &[0, 1]).unwrap();

        let mut matches = matches;
        matches.sort_unstable();
        assert_eq!(matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_subset_indices_are_respected() {
        let kf = KalmanFilter::new();
        let tracks = tracks_at(
            &kf,
            &[Rect::new(0, 0, 40, 80), Rect::new(500, 500, 540, 580)],
        );
        let detections = [Rect::new(498, 500, 538, 580), Rect::new(2, 0, 42, 80)];

        // Only the second track and first detection participate.
        let mut solver = HungarianSolver::new();
        let matches = min_cost_matching(&mut solver, &kf, &tracks, &detections, &[1], &[0]).unwrap();
        assert_eq!(matches, vec![(1, 0)]);
    }
}
