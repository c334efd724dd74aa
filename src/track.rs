//! The track entity: one object's identity, state machine, and filter state.

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

use crate::bbox::{BBox, Tlwh};
use crate::kalman::KalmanFilter;

/// A track's position in the BYTE lifecycle (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    New,
    Tracked,
    Lost,
    Removed,
}

/// One tracked object: identity, lifecycle state, filter state, and the
/// most recently observed detection attributes.
#[derive(Clone, Debug)]
pub struct Track {
    pub track_id: u64,
    pub state: TrackState,
    pub is_activated: bool,
    pub score: f64,
    pub class_name: String,
    pub tlwh: Tlwh,
    pub frame_id: u64,
    pub start_frame: u64,
    pub tracklet_len: u32,

    mean: SVector<f64, 8>,
    covariance: SMatrix<f64, 8, 8>,
}

impl Track {
    /// A brand-new, not-yet-activated track seeded from a detection's box.
    pub fn new(bbox: BBox, score: f64, class_name: String) -> Self {
        Self {
            track_id: 0,
            state: TrackState::New,
            is_activated: false,
            score,
            class_name,
            tlwh: bbox.to_tlwh(),
            frame_id: 0,
            start_frame: 0,
            tracklet_len: 0,
            mean: SVector::<f64, 8>::zeros(),
            covariance: SMatrix::<f64, 8, 8>::identity(),
        }
    }

    pub fn mean(&self) -> &SVector<f64, 8> {
        &self.mean
    }

    fn refresh_tlwh(&mut self) {
        self.tlwh = BBox::from_xyah(self.mean.fixed_rows::<4>(0).into_owned()).to_tlwh();
    }

    /// Initiates the filter from the track's current box, mints a new
    /// `track_id` from `id_counter`, and confirms immediately at frame 0
    /// (§4.3).
    pub fn activate(&mut self, kalman: &KalmanFilter, frame_id: u64, id_counter: &mut u64) {
        *id_counter += 1;
        self.track_id = *id_counter;

        let measurement = BBox::from_tlwh(self.tlwh).to_xyah();
        let (mean, covariance) = kalman.initiate(measurement);
        self.mean = mean;
        self.covariance = covariance;

        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = frame_id == 0;
        self.frame_id = frame_id;
        self.start_frame = frame_id;
    }

    /// Brings a `Lost` track back to `Tracked` via a new association,
    /// optionally minting a fresh `track_id`.
    pub fn re_activate(
        &mut self,
        kalman: &KalmanFilter,
        detection_bbox: BBox,
        score: f64,
        class_name: String,
        frame_id: u64,
        new_id: bool,
        id_counter: &mut u64,
    ) {
        let measurement = detection_bbox.to_xyah();
        let (mean, covariance) = kalman.update(&self.mean, &self.covariance, &measurement);
        self.mean = mean;
        self.covariance = covariance;
        self.refresh_tlwh();

        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
        self.score = score;
        self.class_name = class_name;

        if new_id {
            *id_counter += 1;
            self.track_id = *id_counter;
        }
    }

    /// Incorporates a new association into an already-`Tracked` track.
    pub fn update(
        &mut self,
        kalman: &KalmanFilter,
        detection_bbox: BBox,
        score: f64,
        class_name: String,
        frame_id: u64,
    ) {
        let measurement = detection_bbox.to_xyah();
        let (mean, covariance) = kalman.update(&self.mean, &self.covariance, &measurement);
        self.mean = mean;
        self.covariance = covariance;
        self.refresh_tlwh();

        self.tracklet_len += 1;
        self.is_activated = true;
        self.state = TrackState::Tracked;
        self.frame_id = frame_id;
        self.score = score;
        self.class_name = class_name;
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    /// Advances the filter by one step. A track that isn't currently
    /// `Tracked` has its velocity zeroed first so a lost track doesn't
    /// drift on stale motion (§4.3).
    pub fn predict(&mut self, kalman: &KalmanFilter) {
        let mut mean = self.mean;
        if self.state != TrackState::Tracked {
            mean.fixed_rows_mut::<4>(4).fill(0.0);
        }

        let (new_mean, new_covariance) = kalman.predict(&mean, &self.covariance);
        self.mean = new_mean;
        self.covariance = new_covariance;
        self.refresh_tlwh();
    }

    pub fn multi_predict(tracks: &mut [Track], kalman: &KalmanFilter) {
        for track in tracks {
            track.predict(kalman);
        }
    }

    pub fn tlbr(&self) -> BBox {
        BBox::from_tlwh(self.tlwh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BBox {
        BBox::new(100.0, 100.0, 150.0, 200.0)
    }

    #[test]
    fn test_activate_at_frame_zero_is_immediately_confirmed() {
        let kalman = KalmanFilter::new();
        let mut track = Track::new(bbox(), 0.9, "person".into());
        let mut id_counter = 0u64;

        track.activate(&kalman, 0, &mut id_counter);

        assert!(track.is_activated);
        assert_eq!(track.track_id, 1);
        assert_eq!(track.state, TrackState::Tracked);
    }

    #[test]
    fn test_activate_after_frame_zero_is_tentative() {
        let kalman = KalmanFilter::new();
        let mut track = Track::new(bbox(), 0.9, "person".into());
        let mut id_counter = 0u64;

        track.activate(&kalman, 3, &mut id_counter);

        assert!(!track.is_activated);
        assert_eq!(track.start_frame, 3);
    }

    #[test]
    fn test_predict_on_lost_track_zeroes_velocity_first() {
        let kalman = KalmanFilter::new();
        let mut track = Track::new(bbox(), 0.9, "person".into());
        let mut id_counter = 0u64;
        track.activate(&kalman, 0, &mut id_counter);
        track.update(&kalman, BBox::new(105.0, 100.0, 155.0, 200.0), 0.9, "person".into(), 1);
        track.mark_lost();

        let tlwh_before = track.tlwh;
        track.predict(&kalman);
        // With zeroed velocity the box shouldn't have moved from a lost prediction.
        assert!((track.tlwh.x - tlwh_before.x).abs() < 1e-6);
    }

    #[test]
    fn test_track_ids_mint_in_increasing_order() {
        let kalman = KalmanFilter::new();
        let mut id_counter = 0u64;

        let mut t1 = Track::new(bbox(), 0.9, "person".into());
        t1.activate(&kalman, 0, &mut id_counter);
        let mut t2 = Track::new(bbox(), 0.9, "person".into());
        t2.activate(&kalman, 0, &mut id_counter);

        assert!(t2.track_id > t1.track_id);
    }
}
