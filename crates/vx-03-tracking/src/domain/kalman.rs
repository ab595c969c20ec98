//! Constant-velocity Kalman filter over box measurements.
//!
//! State: `(cx, cy, a, h, vx, vy, va, vh)` where `a` is the aspect ratio
//! `w / h`. Measurements are `(cx, cy, a, h)`. Process and measurement noise
//! scale with the box height.

pub type StateVector = [f64; 8];
pub type StateCovariance = [[f64; 8]; 8];
pub type Measurement = [f64; 4];

pub type MeasurementCovariance = [[f64; 4]; 4];

const STD_WEIGHT_POSITION: f64 = 1.0 / 20.0;
const STD_WEIGHT_VELOCITY: f64 = 1.0 / 160.0;

/// Stateless filter; each track owns its mean and covariance.
#[derive(Debug, Clone, Copy, Default)]
pub struct KalmanBoxFilter;

impl KalmanBoxFilter {
    pub fn new() -> Self {
        Self
    }

    /// Track state from an unassociated measurement, with zero velocity.
    pub fn initiate(&self, measurement: Measurement) -> (StateVector, StateCovariance) {
        let mut mean = [0.0; 8];
        mean[..4].copy_from_slice(&measurement);

        let h = measurement[3];
        let p = STD_WEIGHT_POSITION * h;
        let v = STD_WEIGHT_VELOCITY * h;
        let std = [
            2.0 * p,
            2.0 * p,
            1e-2,
            2.0 * p,
            10.0 * v,
            10.0 * v,
            1e-5,
            10.0 * v,
        ];
        (mean, diagonal8(&std))
    }

    /// Advance one time step.
    pub fn predict(
        &self,
        mean: &StateVector,
        covariance: &StateCovariance,
    ) -> (StateVector, StateCovariance) {
        let h = mean[3];
        let p = STD_WEIGHT_POSITION * h;
        let v = STD_WEIGHT_VELOCITY * h;
        let q = diagonal8(&[p, p, 1e-2, p, v, v, 1e-5, v]);

        let mut next = *mean;
        for i in 0..4 {
            next[i] += mean[i + 4];
        }

        // F P F^T with F = [[I, I], [0, I]]
        let mut cov = *covariance;
        for i in 0..4 {
            for j in 0..8 {
                cov[i][j] += covariance[i + 4][j];
            }
        }
        let fp = cov;
        for i in 0..8 {
            for j in 0..4 {
                cov[i][j] = fp[i][j] + fp[i][j + 4];
            }
        }
        for i in 0..8 {
            for j in 0..8 {
                cov[i][j] += q[i][j];
            }
        }
        (next, cov)
    }

    /// Project the state into measurement space.
    pub fn project(
        &self,
        mean: &StateVector,
        covariance: &StateCovariance,
    ) -> (Measurement, MeasurementCovariance) {
        let h = mean[3];
        let p = STD_WEIGHT_POSITION * h;
        let std = [p, p, 1e-1, p];

        let mut projected = [0.0; 4];
        projected.copy_from_slice(&mean[..4]);

        let mut cov = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                cov[i][j] = covariance[i][j];
            }
            cov[i][i] += std[i] * std[i];
        }
        (projected, cov)
    }

    /// Correct the state with a measurement.
    ///
    /// Returns the input unchanged if the innovation covariance is not
    /// positive definite.
    pub fn update(
        &self,
        mean: &StateVector,
        covariance: &StateCovariance,
        measurement: Measurement,
    ) -> (StateVector, StateCovariance) {
        let (projected, s) = self.project(mean, covariance);
        let Some(chol) = cholesky4(&s) else {
            return (*mean, *covariance);
        };

        // K = P H^T S^-1, solved row by row since S is symmetric
        let mut gain = [[0.0; 4]; 8];
        for (i, row) in gain.iter_mut().enumerate() {
            let pht = [
                covariance[i][0],
                covariance[i][1],
                covariance[i][2],
                covariance[i][3],
            ];
            *row = cholesky_solve4(&chol, pht);
        }

        let mut innovation = [0.0; 4];
        for k in 0..4 {
            innovation[k] = measurement[k] - projected[k];
        }

        let mut new_mean = *mean;
        for i in 0..8 {
            for k in 0..4 {
                new_mean[i] += gain[i][k] * innovation[k];
            }
        }

        // P - K S K^T
        let mut ks = [[0.0; 4]; 8];
        for i in 0..8 {
            for j in 0..4 {
                ks[i][j] = (0..4).map(|k| gain[i][k] * s[k][j]).sum();
            }
        }
        let mut new_cov = *covariance;
        for i in 0..8 {
            for j in 0..8 {
                new_cov[i][j] -= (0..4).map(|k| ks[i][k] * gain[j][k]).sum::<f64>();
            }
        }
        (new_mean, new_cov)
    }
}

fn diagonal8(std: &[f64; 8]) -> StateCovariance {
    let mut m = [[0.0; 8]; 8];
    for i in 0..8 {
        m[i][i] = std[i] * std[i];
    }
    m
}

/// Lower-triangular factor of a symmetric positive-definite matrix.
fn cholesky4(a: &MeasurementCovariance) -> Option<MeasurementCovariance> {
    let mut l = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let d = a[i][i] - sum;
                if d.is_nan() || d <= 0.0 {
                    return None;
                }
                l[i][j] = d.sqrt();
            } else {
                l[i][j] = (a[i][j] - sum) / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solve `L L^T x = b`.
fn cholesky_solve4(l: &MeasurementCovariance, b: [f64; 4]) -> [f64; 4] {
    let mut y = [0.0; 4];
    for i in 0..4 {
        let sum: f64 = (0..i).map(|k| l[i][k] * y[k]).sum();
        y[i] = (b[i] - sum) / l[i][i];
    }
    let mut x = [0.0; 4];
    for i in (0..4).rev() {
        let sum: f64 = (i + 1..4).map(|k| l[k][i] * x[k]).sum();
        x[i] = (y[i] - sum) / l[i][i];
    }
    x
}
