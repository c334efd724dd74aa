//! The per-frame orchestrator: split detections by confidence, predict,
//! associate in two rounds, birth/reactivate/retire.

use serde::{Deserialize, Serialize};

use crate::bbox::{BBox, Tlwh};
use crate::error::TrackerError;
use crate::geometry::{fuse_score, iou_distance};
use crate::kalman::KalmanFilter;
use crate::lap::rectangular_assign;
use crate::track::{Track, TrackState};

const LOW_CONFIDENCE_MATCH_THRESH: f64 = 0.5;

/// One detection as reported by an upstream detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detection {
    pub tlbr: BBox,
    pub score: f64,
    pub class_name: String,
}

/// One confirmed, currently-visible track as reported to a caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub track_id: u64,
    pub tlwh: Tlwh,
    pub score: f64,
    pub class_name: String,
}

/// BYTE multi-object tracker: holds the tracked/lost/removed lists and
/// runs the per-frame association pipeline (§4.4).
pub struct ByteTracker {
    track_thresh: f64,
    high_thresh: f64,
    match_thresh: f64,
    max_time_lost: u64,

    frame_id: u64,
    id_counter: u64,

    tracked_stracks: Vec<Track>,
    lost_stracks: Vec<Track>,
    removed_stracks: Vec<Track>,

    kalman: KalmanFilter,
}

impl ByteTracker {
    /// Builds a tracker, validating its thresholds and frame rate.
    ///
    /// `high_thresh` defaults to `track_thresh + 0.1` when `None`.
    pub fn new(
        frame_rate: f64,
        track_buffer: u64,
        track_thresh: f64,
        high_thresh: Option<f64>,
        match_thresh: f64,
    ) -> Result<Self, TrackerError> {
        if !(0.0..=1.0).contains(&track_thresh) {
            return Err(TrackerError::InvalidTrackThresh(track_thresh));
        }
        let high_thresh = high_thresh.unwrap_or(track_thresh + 0.1);
        if !(0.0..=1.0).contains(&high_thresh) {
            return Err(TrackerError::InvalidHighThresh(high_thresh));
        }
        if !(0.0..=1.0).contains(&match_thresh) {
            return Err(TrackerError::InvalidMatchThresh(match_thresh));
        }
        if frame_rate <= 0.0 {
            return Err(TrackerError::InvalidFrameRate(frame_rate));
        }

        let max_time_lost = ((frame_rate / 30.0) * track_buffer as f64).trunc() as u64;

        Ok(Self {
            track_thresh,
            high_thresh,
            match_thresh,
            max_time_lost,
            frame_id: 0,
            id_counter: 0,
            tracked_stracks: Vec::new(),
            lost_stracks: Vec::new(),
            removed_stracks: Vec::new(),
            kalman: KalmanFilter::new(),
        })
    }

    /// Advances the tracker by one frame, returning the currently
    /// confirmed, visible tracks (§4.4 steps 1-7).
    pub fn update(&mut self, detections: &[Detection]) -> Vec<TrackedObject> {
        let _span = tracing::debug_span!("byte_tracker.update", frame_id = self.frame_id).entered();
        self.frame_id += 1;

        // Step 1: split detections by confidence, discarding score < 0.1.
        let (high_dets, low_dets): (Vec<&Detection>, Vec<&Detection>) = detections
            .iter()
            .filter(|d| d.score >= 0.1)
            .partition(|d| d.score >= self.track_thresh);

        // Step 2: predict the pool of tracked (confirmed or tentative) + lost tracks.
        let mut tracked = std::mem::take(&mut self.tracked_stracks);
        let mut lost = std::mem::take(&mut self.lost_stracks);
        let mut pool: Vec<Track> = tracked.drain(..).chain(lost.drain(..)).collect();
        Track::multi_predict(&mut pool, &self.kalman);

        // Step 3: round 1 — fused-score association of high-confidence
        // detections against the predicted pool.
        let pool_boxes: Vec<BBox> = pool.iter().map(|t| t.tlbr()).collect();
        let high_boxes: Vec<BBox> = high_dets.iter().map(|d| d.tlbr).collect();
        let mut cost = iou_distance(&pool_boxes, &high_boxes);
        let high_scores: Vec<f64> = high_dets.iter().map(|d| d.score).collect();
        fuse_score(&mut cost, &high_scores);

        let (matches, unmatched_tracks, unmatched_high_dets) =
            rectangular_assign(pool.len(), high_dets.len(), &cost, self.match_thresh)
                .unwrap_or_else(|err| {
                    tracing::warn!(%err, "round 1 association failed to converge, treating all as unmatched");
                    (Vec::new(), (0..pool.len()).collect(), (0..high_dets.len()).collect())
                });

        let mut still_tracked = Vec::new();
        let mut matched_pool = vec![false; pool.len()];
        for (pi, di) in &matches {
            matched_pool[*pi] = true;
            let det = high_dets[*di];
            let track = &mut pool[*pi];
            if track.state == TrackState::Tracked {
                track.update(&self.kalman, det.tlbr, det.score, det.class_name.clone(), self.frame_id);
            } else {
                track.re_activate(
                    &self.kalman,
                    det.tlbr,
                    det.score,
                    det.class_name.clone(),
                    self.frame_id,
                    false,
                    &mut self.id_counter,
                );
                tracing::debug!(track_id = track.track_id, "track reactivated");
            }
        }

        // Step 4: round 2 — plain-IoU association of low-confidence
        // detections against tracks still unmatched from round 1 (only
        // those that were `Tracked` going in).
        let round2_indices: Vec<usize> = unmatched_tracks
            .iter()
            .copied()
            .filter(|&i| pool[i].state == TrackState::Tracked)
            .collect();
        let round2_boxes: Vec<BBox> = round2_indices.iter().map(|&i| pool[i].tlbr()).collect();
        let low_boxes: Vec<BBox> = low_dets.iter().map(|d| d.tlbr).collect();
        let cost2 = iou_distance(&round2_boxes, &low_boxes);

        let (matches2, unmatched_round2, _unmatched_low_dets) =
            rectangular_assign(round2_indices.len(), low_dets.len(), &cost2, LOW_CONFIDENCE_MATCH_THRESH)
                .unwrap_or_else(|err| {
                    tracing::warn!(%err, "round 2 association failed to converge, treating all as unmatched");
                    (Vec::new(), (0..round2_indices.len()).collect(), (0..low_dets.len()).collect())
                });

        let mut matched_round2 = vec![false; round2_indices.len()];
        for (ri, di) in &matches2 {
            matched_round2[*ri] = true;
            let pi = round2_indices[*ri];
            matched_pool[pi] = true;
            let det = low_dets[*di];
            pool[pi].update(&self.kalman, det.tlbr, det.score, det.class_name.clone(), self.frame_id);
        }

        // Step 5: anything still unmatched after both rounds is lost now.
        for &ri in &unmatched_round2 {
            let pi = round2_indices[ri];
            if !matched_pool[pi] {
                pool[pi].mark_lost();
            }
        }
        for (i, track) in pool.iter_mut().enumerate() {
            if !matched_pool[i] && track.state == TrackState::Tracked {
                track.mark_lost();
            }
        }

        for track in pool.into_iter() {
            match track.state {
                TrackState::Tracked => still_tracked.push(track),
                TrackState::Lost => lost.push(track),
                _ => {}
            }
        }

        // Step 6: births from high-confidence detections still unmatched
        // after round 1, gated on `high_thresh`.
        let mut born = Vec::new();
        for &di in &unmatched_high_dets {
            let det = high_dets[di];
            if det.score < self.high_thresh {
                continue;
            }
            let mut track = Track::new(det.tlbr, det.score, det.class_name.clone());
            track.activate(&self.kalman, self.frame_id, &mut self.id_counter);
            tracing::debug!(track_id = track.track_id, "track born");
            born.push(track);
        }

        // Step 7: retire lost tracks past `max_time_lost`, reconcile lists.
        let frame_id = self.frame_id;
        let max_time_lost = self.max_time_lost;
        let mut removed = Vec::new();
        lost.retain_mut(|t| {
            if frame_id.saturating_sub(t.frame_id) > max_time_lost {
                t.mark_removed();
                tracing::debug!(track_id = t.track_id, "track removed (lost timeout)");
                removed.push(t.clone());
                false
            } else {
                true
            }
        });

        still_tracked.extend(born);

        remove_duplicates(&mut still_tracked, &mut lost);

        self.tracked_stracks = still_tracked;
        self.lost_stracks = lost;
        self.removed_stracks.extend(removed);

        self.tracked_stracks
            .iter()
            .filter(|t| t.is_activated)
            .map(|t| TrackedObject {
                track_id: t.track_id,
                tlwh: t.tlwh,
                score: t.score,
                class_name: t.class_name.clone(),
            })
            .collect()
    }
}

/// Resolves duplicate tracks (high-IoU pairs across the tracked/lost
/// lists) by keeping the longer-lived tracklet, per spec.md §4.4.
fn remove_duplicates(tracked: &mut Vec<Track>, lost: &mut Vec<Track>) {
    let mut drop_tracked = vec![false; tracked.len()];
    let mut drop_lost = vec![false; lost.len()];

    for (i, a) in tracked.iter().enumerate() {
        for (j, b) in lost.iter().enumerate() {
            if a.tlbr().iou(&b.tlbr()) < 0.85 {
                continue;
            }
            let age_a = a.frame_id.saturating_sub(a.start_frame);
            let age_b = b.frame_id.saturating_sub(b.start_frame);
            if age_a >= age_b {
                drop_lost[j] = true;
            } else {
                drop_tracked[i] = true;
            }
        }
    }

    let mut ti = 0;
    tracked.retain(|_| {
        let keep = !drop_tracked[ti];
        ti += 1;
        keep
    });
    let mut li = 0;
    lost.retain(|_| {
        let keep = !drop_lost[li];
        li += 1;
        keep
    });
}
