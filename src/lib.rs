//! Spectral processing core for voice denoising and analysis.
//!
//! - [`dsp::RingBuffer`]: fixed-capacity sample FIFO with in-place overwrite.
//! - [`dsp::ScalarKalmanFilter`]: 1-D smoother for per-frame parameters.
//! - [`dsp::Partial`]: one tracked sinusoidal peak.
//! - [`dsp::FilterBank`]: linear <-> Mel/Bark/Log magnitude resampling.
//! - [`dsp::WienerSoftMasking`]: history-smoothed two-source soft masking.
//!
//! Everything on the per-frame path works on caller-provided slices and does
//! not allocate once configured. Configuration calls validate their input and
//! return [`DspError`].

pub mod config;
pub mod debug;
pub mod dsp;
pub mod error;
pub mod handoff;
pub mod presets;

pub use config::{CoreConfig, FilterBankConfig};
pub use error::DspError;
pub use handoff::{curve_handoff, CurveReader, CurveWriter};
pub use presets::{PresetManager, PresetValues, SmoothingPreset};
