//! Scalar Kalman Smoother
//!
//! One-dimensional, constant-parameter recursive estimator used to smooth a
//! noisy per-frame quantity (partial frequency, amplitude). There is no
//! separate prediction step: the prediction is the last estimate.
//!
//! # Tuning
//! - `measurement_error` and `estimate_error` are usually set to the same
//!   small value.
//! - `process_noise` between 0.001 (smooth, slow) and 1.0 (responsive).
//!
//! # Real-time
//! `update_estimate` is a handful of flops and never allocates.

use serde::{Deserialize, Serialize};

/// Default measurement/estimate error for frequency smoothing.
pub const DEFAULT_ERROR: f32 = 0.03;
/// Default process noise for frequency smoothing.
pub const DEFAULT_PROCESS_NOISE: f32 = 0.05;

/// Tunable parameters, stored in configs and presets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanParams {
    pub measurement_error: f32,
    pub estimate_error: f32,
    pub process_noise: f32,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            measurement_error: DEFAULT_ERROR,
            estimate_error: DEFAULT_ERROR,
            process_noise: DEFAULT_PROCESS_NOISE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarKalmanFilter {
    measurement_error: f32,
    estimate_error: f32,
    process_noise: f32,

    last_estimate: f32,
    current_estimate: f32,
    gain: f32,

    /// Error variance restored by `reset`.
    initial_estimate_error: f32,
}

impl Default for ScalarKalmanFilter {
    fn default() -> Self {
        Self::from_params(KalmanParams::default())
    }
}

impl ScalarKalmanFilter {
    pub fn new(measurement_error: f32, estimate_error: f32, process_noise: f32) -> Self {
        Self {
            measurement_error,
            estimate_error: estimate_error.max(0.0),
            process_noise,
            last_estimate: 0.0,
            current_estimate: 0.0,
            gain: 0.0,
            initial_estimate_error: estimate_error.max(0.0),
        }
    }

    pub fn from_params(params: KalmanParams) -> Self {
        Self::new(
            params.measurement_error,
            params.estimate_error,
            params.process_noise,
        )
    }

    /// Seeds the filter so the first update does not jump from zero.
    pub fn init_estimate(&mut self, value: f32) {
        self.last_estimate = value;
        self.current_estimate = value;
    }

    /// Folds one measurement in and returns the new smoothed value.
    #[inline]
    pub fn update_estimate(&mut self, measurement: f32) -> f32 {
        let denom = self.estimate_error + self.measurement_error;
        self.gain = if denom > 0.0 {
            self.estimate_error / denom
        } else {
            0.0
        };

        self.current_estimate =
            self.last_estimate + self.gain * (measurement - self.last_estimate);

        self.estimate_error = (1.0 - self.gain) * self.estimate_error
            + (self.last_estimate - self.current_estimate).abs() * self.process_noise;
        self.estimate_error = self.estimate_error.max(0.0);

        self.last_estimate = self.current_estimate;
        self.current_estimate
    }

    /// Restores the initial error variance and clears the estimate.
    pub fn reset(&mut self) {
        self.estimate_error = self.initial_estimate_error;
        self.last_estimate = 0.0;
        self.current_estimate = 0.0;
        self.gain = 0.0;
    }

    pub fn set_params(&mut self, params: KalmanParams) {
        self.set_measurement_error(params.measurement_error);
        self.set_estimate_error(params.estimate_error);
        self.set_process_noise(params.process_noise);
    }

    pub fn set_measurement_error(&mut self, value: f32) {
        self.measurement_error = value;
    }

    pub fn set_estimate_error(&mut self, value: f32) {
        self.estimate_error = value.max(0.0);
        self.initial_estimate_error = self.estimate_error;
    }

    pub fn set_process_noise(&mut self, value: f32) {
        self.process_noise = value;
    }

    pub fn measurement_error(&self) -> f32 {
        self.measurement_error
    }

    pub fn estimate_error(&self) -> f32 {
        self.estimate_error
    }

    pub fn process_noise(&self) -> f32 {
        self.process_noise
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn current_estimate(&self) -> f32 {
        self.current_estimate
    }
}
