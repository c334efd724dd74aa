//! Constant-velocity Kalman filter over `xyah` bounding-box state.
//!
//! The filter itself holds no per-track state; tracks own their own
//! `(mean, covariance)` pair and pass it in on every call (§5).

use nalgebra::{SMatrix, SVector, linalg::Cholesky};

/// 95th-percentile quantile of the chi-squared distribution, indexed by
/// degrees of freedom (1..=9). The tracker uses the 4-DoF value as a gating
/// threshold when it needs one.
pub const CHI2INV95: [f64; 10] = [
    0.0, 3.8415, 5.9915, 7.8147, 9.4877, 11.070, 12.592, 14.067, 15.507, 16.919,
];

const STD_WEIGHT_POSITION: f64 = 1.0 / 20.0;
const STD_WEIGHT_VELOCITY: f64 = 1.0 / 160.0;

/// Mean/covariance pair tracked by a `Track`; the filter is a stateless
/// function over these.
pub type State8 = (SVector<f64, 8>, SMatrix<f64, 8, 8>);

#[derive(Clone, Copy, Debug)]
pub struct KalmanFilter {
    motion_mat: SMatrix<f64, 8, 8>,
    update_mat: SMatrix<f64, 4, 8>,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = SMatrix::<f64, 8, 8>::identity();
        for i in 0..4 {
            motion_mat[(i, i + 4)] = 1.0;
        }
        let update_mat = SMatrix::<f64, 4, 8>::identity();

        Self { motion_mat, update_mat }
    }

    /// Builds the initial (mean, covariance) state from a single `xyah` measurement.
    pub fn initiate(&self, measurement: SVector<f64, 4>) -> State8 {
        let mut mean = SVector::<f64, 8>::zeros();
        mean.fixed_rows_mut::<4>(0).copy_from(&measurement);

        let h = measurement[3];
        let std = [
            2.0 * STD_WEIGHT_POSITION * h,
            2.0 * STD_WEIGHT_POSITION * h,
            1e-2,
            2.0 * STD_WEIGHT_POSITION * h,
            10.0 * STD_WEIGHT_VELOCITY * h,
            10.0 * STD_WEIGHT_VELOCITY * h,
            1e-5,
            10.0 * STD_WEIGHT_VELOCITY * h,
        ];
        let covariance = diag_squared(&std);

        (mean, covariance)
    }

    /// Advances `(mean, covariance)` by one time step.
    pub fn predict(&self, mean: &SVector<f64, 8>, covariance: &SMatrix<f64, 8, 8>) -> State8 {
        let h = mean[3];
        let std_pos = [
            STD_WEIGHT_POSITION * h,
            STD_WEIGHT_POSITION * h,
            1e-2,
            STD_WEIGHT_POSITION * h,
        ];
        let std_vel = [
            STD_WEIGHT_VELOCITY * h,
            STD_WEIGHT_VELOCITY * h,
            1e-5,
            STD_WEIGHT_VELOCITY * h,
        ];
        let std = [
            std_pos[0], std_pos[1], std_pos[2], std_pos[3], std_vel[0], std_vel[1], std_vel[2],
            std_vel[3],
        ];
        let motion_cov = diag_squared(&std);

        let new_mean = self.motion_mat * mean;
        let new_covariance = self.motion_mat * covariance * self.motion_mat.transpose() + motion_cov;

        (new_mean, new_covariance)
    }

    /// Projects `(mean, covariance)` into measurement space, returning `(H*mean, H*cov*H' + R)`.
    pub fn project(
        &self,
        mean: &SVector<f64, 8>,
        covariance: &SMatrix<f64, 8, 8>,
    ) -> (SVector<f64, 4>, SMatrix<f64, 4, 4>) {
        let h = mean[3];
        let std = [
            STD_WEIGHT_POSITION * h,
            STD_WEIGHT_POSITION * h,
            1e-1,
            STD_WEIGHT_POSITION * h,
        ];
        let innovation_cov = diag_squared4(&std);

        let projected_mean = self.update_mat * mean;
        let projected_cov = self.update_mat * covariance * self.update_mat.transpose() + innovation_cov;

        (projected_mean, projected_cov)
    }

    /// Incorporates a new `xyah` measurement via the standard Kalman update,
    /// computed through a Cholesky factorization of the innovation
    /// covariance to avoid an explicit matrix inverse.
    ///
    /// If the innovation covariance is not positive-definite (a numerical
    /// degeneracy spec.md §7 leaves as an open question), the update is
    /// skipped and the prior state is returned unchanged.
    pub fn update(
        &self,
        mean: &SVector<f64, 8>,
        covariance: &SMatrix<f64, 8, 8>,
        measurement: &SVector<f64, 4>,
    ) -> State8 {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let Some(chol) = Cholesky::new(projected_cov) else {
            tracing::warn!("kalman update skipped: innovation covariance is not positive-definite");
            return (*mean, *covariance);
        };

        let gain_transposed = chol.solve(&(covariance * self.update_mat.transpose()).transpose());
        let kalman_gain = gain_transposed.transpose();

        let innovation = measurement - projected_mean;
        let new_mean = mean + kalman_gain * innovation;
        let new_covariance = covariance - kalman_gain * projected_cov * kalman_gain.transpose();

        (new_mean, new_covariance)
    }

    /// Squared Mahalanobis distance of each measurement against the
    /// projected distribution. If `only_position`, only the first two
    /// (x, y) dimensions are used.
    pub fn gating_distance(
        &self,
        mean: &SVector<f64, 8>,
        covariance: &SMatrix<f64, 8, 8>,
        measurements: &[SVector<f64, 4>],
        only_position: bool,
    ) -> Vec<f64> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        if only_position {
            let mean2 = projected_mean.fixed_rows::<2>(0).into_owned();
            let cov2 = projected_cov.fixed_view::<2, 2>(0, 0).into_owned();
            let Some(chol) = Cholesky::new(cov2) else {
                return vec![f64::INFINITY; measurements.len()];
            };
            measurements
                .iter()
                .map(|m| {
                    let d = m.fixed_rows::<2>(0).into_owned() - mean2;
                    let inv_d = chol.solve(&d);
                    d.dot(&inv_d)
                })
                .collect()
        } else {
            let Some(chol) = Cholesky::new(projected_cov) else {
                return vec![f64::INFINITY; measurements.len()];
            };
            measurements
                .iter()
                .map(|m| {
                    let d = m - projected_mean;
                    let inv_d = chol.solve(&d);
                    d.dot(&inv_d)
                })
                .collect()
        }
    }
}

fn diag_squared(std: &[f64; 8]) -> SMatrix<f64, 8, 8> {
    let squared = SVector::<f64, 8>::from_iterator(std.iter().map(|s| s * s));
    SMatrix::<f64, 8, 8>::from_diagonal(&squared)
}

fn diag_squared4(std: &[f64; 4]) -> SMatrix<f64, 4, 4> {
    let squared = SVector::<f64, 4>::from_iterator(std.iter().map(|s| s * s));
    SMatrix::<f64, 4, 4>::from_diagonal(&squared)
}
