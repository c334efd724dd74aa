use thiserror::Error;

/// Errors surfaced by the tracker's fallible, caller-facing operations.
///
/// `ByteTracker::update` itself is infallible: per-frame degeneracies
/// (a non positive-definite innovation covariance, a detection with a
/// degenerate box) are logged and the affected measurement is skipped
/// rather than propagated, since a frame-level failure would otherwise
/// leave the tracker's internal lists in an inconsistent state.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("track_thresh must be in [0, 1], got {0}")]
    InvalidTrackThresh(f64),
    #[error("high_thresh must be in [0, 1], got {0}")]
    InvalidHighThresh(f64),
    #[error("match_thresh must be in [0, 1], got {0}")]
    InvalidMatchThresh(f64),
    #[error("frame_rate must be positive, got {0}")]
    InvalidFrameRate(f64),
    #[error("linear assignment on a {n}x{n} cost matrix did not converge")]
    LapDidNotConverge { n: usize },
}
