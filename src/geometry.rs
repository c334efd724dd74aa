//! Cost-matrix construction on top of [`BBox::iou`](crate::bbox::BBox::iou).

use crate::bbox::BBox;

/// `M[i,j] = 1 - iou(tracks[i], dets[j])`, in `[0, 1]`.
pub fn iou_distance(tracks: &[BBox], dets: &[BBox]) -> Vec<Vec<f64>> {
    tracks
        .iter()
        .map(|track| dets.iter().map(|det| 1.0 - track.iou(det)).collect())
        .collect()
}

/// `cost[i,j] <- 1 - (1 - cost[i,j]) * dets[j].score`.
pub fn fuse_score(cost: &mut [Vec<f64>], det_scores: &[f64]) {
    for row in cost.iter_mut() {
        for (j, score) in det_scores.iter().enumerate() {
            row[j] = 1.0 - (1.0 - row[j]) * score;
        }
    }
}
