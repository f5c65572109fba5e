//! Kalman filter for bounding box tracking using ndarray and a manual/nalgebra-based solve.

use ndarray::{Array1, Array2};

use crate::tracker::error::Error;

/// 0.95 quantile of the chi-square distribution, indexed by degrees of
/// freedom minus one. `CHI2INV95[3]` gates a 4-dimensional measurement.
pub const CHI2INV95: [f32; 9] = [
    3.8415, 5.9915, 7.8147, 9.4877, 11.070, 12.592, 14.067, 15.507, 16.919,
];

/// Constant-velocity filter over the 8-dimensional state
/// `(cx, cy, aspect, height, vcx, vcy, va, vh)` with a 4-dimensional
/// `(cx, cy, aspect, height)` measurement.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f32>,
    update_mat: Array2<f32>,
    std_weight_position: f32,
    std_weight_velocity: f32,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let ndim = 4;
        let mut motion_mat = Array2::eye(2 * ndim);
        for i in 0..ndim {
            motion_mat[[i, ndim + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((ndim, 2 * ndim));
        for i in 0..ndim {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 10.0,
        }
    }

    /// Seed a track state from an unassociated measurement.
    ///
    /// Velocities start at zero; the covariance is diagonal, scaled by the
    /// measured height. The height-velocity entry is seeded an order of
    /// magnitude looser than the other velocities.
    pub fn initiate(&self, measurement: [f32; 4]) -> (Array1<f32>, Array2<f32>) {
        let mut mean = Array1::zeros(8);
        for i in 0..4 {
            mean[i] = measurement[i];
        }

        let h = measurement[3];
        let std = [
            2.0 * self.std_weight_position * h,
            2.0 * self.std_weight_position * h,
            1e-1,
            2.0 * self.std_weight_position * h,
            2.0 * self.std_weight_velocity * h,
            2.0 * self.std_weight_velocity * h,
            5e-1,
            10.0 * self.std_weight_velocity * h,
        ];

        let mut cov = Array2::zeros((8, 8));
        for i in 0..8 {
            cov[[i, i]] = std[i] * std[i];
        }

        (mean, cov)
    }

    /// Propagate the state distribution one frame forward.
    pub fn predict(
        &self,
        mean: &Array1<f32>,
        covariance: &Array2<f32>,
    ) -> (Array1<f32>, Array2<f32>) {
        let h = mean[3];
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-1,
            self.std_weight_position * h,
            self.std_weight_velocity * h,
            self.std_weight_velocity * h,
            5e-1,
            self.std_weight_velocity * h,
        ];

        let mut motion_cov = Array2::zeros((8, 8));
        for i in 0..8 {
            motion_cov[[i, i]] = std[i] * std[i];
        }

        let new_mean = self.motion_mat.dot(mean);
        let new_covariance = self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    /// Project the state distribution into measurement space, adding the
    /// innovation covariance.
    pub fn project(
        &self,
        mean: &Array1<f32>,
        covariance: &Array2<f32>,
    ) -> (Array1<f32>, Array2<f32>) {
        let h = mean[3];
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            5e-1,
            self.std_weight_position * h,
        ];

        let mut innovation_cov = Array2::zeros((4, 4));
        for i in 0..4 {
            innovation_cov[[i, i]] = std[i] * std[i];
        }

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Run the correction step against a measurement.
    ///
    /// Returns `None` when the innovation covariance is singular; the
    /// caller keeps the predicted state in that case.
    pub fn update(
        &self,
        mean: &Array1<f32>,
        covariance: &Array2<f32>,
        measurement: [f32; 4],
    ) -> Option<(Array1<f32>, Array2<f32>)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        // K = P * H^T * S^-1
        // Since H is [I 0], P * H^T is the first 4 columns of P (8x4).
        let s_inv = self.invert_4x4(&projected_cov)?;

        let measurement_arr = Array1::from_vec(measurement.to_vec());
        let innovation = measurement_arr - projected_mean;

        let pht = covariance.dot(&self.update_mat.t()); // 8x4
        let kalman_gain = pht.dot(&s_inv); // 8x4

        let new_mean = mean + kalman_gain.dot(&innovation);
        let new_covariance = covariance - kalman_gain.dot(&self.update_mat).dot(covariance);

        Some((new_mean, new_covariance))
    }

    /// Squared Mahalanobis distance between the state distribution and a
    /// measurement, evaluated in the projected measurement space.
    ///
    /// An innovation covariance without a Cholesky factor yields `+inf`,
    /// which gates the pair out instead of aborting the frame. The
    /// `only_position` variant is not implemented and is rejected.
    pub fn gating_distance(
        &self,
        mean: &Array1<f32>,
        covariance: &Array2<f32>,
        measurement: [f32; 4],
        only_position: bool,
    ) -> Result<f32, Error> {
        if only_position {
            return Err(Error::PositionOnlyGating);
        }

        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let mut s = nalgebra::Matrix4::zeros();
        for i in 0..4 {
            for j in 0..4 {
                s[(i, j)] = projected_cov[[i, j]];
            }
        }
        let cholesky = match s.cholesky() {
            Some(cholesky) => cholesky,
            None => return Ok(f32::INFINITY),
        };

        let d = nalgebra::Vector4::new(
            measurement[0] - projected_mean[0],
            measurement[1] - projected_mean[1],
            measurement[2] - projected_mean[2],
            measurement[3] - projected_mean[3],
        );
        let squared_maha = d.dot(&cholesky.solve(&d));
        if !squared_maha.is_finite() {
            return Ok(f32::INFINITY);
        }

        Ok(squared_maha)
    }

    /// Helper to invert a 4x4 matrix using nalgebra (pure Rust).
    fn invert_4x4(&self, m: &Array2<f32>) -> Option<Array2<f32>> {
        let mut nm = nalgebra::Matrix4::zeros();
        for i in 0..4 {
            for j in 0..4 {
                nm[(i, j)] = m[[i, j]];
            }
        }
        let inv = nm.try_inverse()?;
        let mut res = Array2::zeros((4, 4));
        for i in 0..4 {
            for j in 0..4 {
                res[[i, j]] = inv[(i, j)];
            }
        }
        Some(res)
    }
}
