mod bbox;
mod error;
mod geometry;
mod kalman;
mod lap;
mod track;
mod tracker;

pub use bbox::{BBox, Tlwh};
pub use error::TrackerError;
pub use kalman::{KalmanFilter, CHI2INV95};
pub use lap::{lapjv, rectangular_assign, NO_MATCH_SENTINEL};
pub use track::{Track, TrackState};
pub use tracker::{ByteTracker, Detection, TrackedObject};
