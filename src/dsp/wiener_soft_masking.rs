//! Wiener Soft Masking (History-Smoothed)
//!
//! Splits a mixture spectrum into a denoised part and its residual using
//! power estimates smoothed over a short history of frames, instead of
//! applying the caller's instantaneous soft mask directly. This trades a
//! fixed delay for far less musical noise.
//!
//! # Model
//! For every incoming frame `X` with soft mask `m` (per bin, `[0,1]`):
//! 1. Store `X`, `|m X|^2` and `|(1-m) X|^2` in the history.
//! 2. `sigma2_k` = Hann-weighted mean of `|m_k X|^2` over the frames present
//!    (only those: a partially filled history is not divided by its depth).
//! 3. For the centre frame `Xc`:
//!    `S = Xc * s0^p / (s0^p + s1^p)`, `N = Xc - S`, with `p` the gain exponent
//!    (1.0 is the classic Wiener ratio).
//!
//! # Centering
//! Outputs refer to the frame `history_size / 2` hops back, so the mixture
//! passed in `io_sum` is replaced by that centre frame as well and all three
//! buffers stay time-aligned. Before the centre frame exists the outputs are
//! silent. [`WienerSoftMasking::latency`] reports the delay in samples.
//!
//! # Lifecycle
//! - **Active**: masks re-derived from smoothed statistics.
//! - **Bypassed**: history still fills (latency unchanged), the centre frame is
//!   passed through unmasked and the residual is silent.

use crate::dsp::utils::{make_open_hann_weights, POWER_EPS};
use crate::error::{check_len, DspError};
use crate::vx_log;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

const DEFAULT_BUFFER_SIZE: usize = 2048;
const DEFAULT_OVERLAP: usize = 4;
const DEFAULT_HISTORY_SIZE: usize = 5;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WienerConfig {
    pub buffer_size: usize,
    pub overlap: usize,
    pub history_size: usize,
    /// Exponent applied to both power estimates before taking the ratio.
    pub gain_exponent: f32,
}

impl Default for WienerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            overlap: DEFAULT_OVERLAP,
            history_size: DEFAULT_HISTORY_SIZE,
            gain_exponent: 1.0,
        }
    }
}

impl WienerConfig {
    pub fn validate(&self) -> Result<(), DspError> {
        validate_framing(self.buffer_size, self.overlap)?;
        if self.history_size == 0 {
            return Err(DspError::InvalidHistorySize(self.history_size));
        }
        check_gain_exponent(self.gain_exponent)
    }
}

fn check_gain_exponent(exponent: f32) -> Result<(), DspError> {
    if exponent.is_finite() && exponent > 0.0 {
        Ok(())
    } else {
        Err(DspError::InvalidGainExponent(exponent))
    }
}

fn validate_framing(buffer_size: usize, overlap: usize) -> Result<(), DspError> {
    if buffer_size == 0 {
        return Err(DspError::InvalidBufferSize(buffer_size));
    }
    if overlap == 0 || overlap > buffer_size || buffer_size % overlap != 0 {
        return Err(DspError::InvalidOverlap {
            buffer_size,
            overlap,
        });
    }
    Ok(())
}

// =============================================================================
// History
// =============================================================================

/// One frame of spectral statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLine {
    pub sum: Vec<Complex<f32>>,
    pub masked0_square: Vec<f32>,
    pub masked1_square: Vec<f32>,
}

impl HistoryLine {
    pub fn new(num_bins: usize) -> Self {
        Self {
            sum: vec![Complex::new(0.0, 0.0); num_bins],
            masked0_square: vec![0.0; num_bins],
            masked1_square: vec![0.0; num_bins],
        }
    }

    pub fn resize(&mut self, num_bins: usize) {
        self.sum.resize(num_bins, Complex::new(0.0, 0.0));
        self.masked0_square.resize(num_bins, 0.0);
        self.masked1_square.resize(num_bins, 0.0);
    }

    pub fn len(&self) -> usize {
        self.sum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sum.is_empty()
    }
}

/// Bounded queue of [`HistoryLine`]s with push-evict semantics.
///
/// Slots are allocated up front and recycled, so pushing never allocates.
#[derive(Debug, Clone)]
pub struct SpectralHistory {
    lines: Vec<HistoryLine>,
    /// Slot of the oldest frame.
    head: usize,
    len: usize,
    num_bins: usize,
}

impl SpectralHistory {
    pub fn new(depth: usize, num_bins: usize) -> Self {
        Self {
            lines: (0..depth).map(|_| HistoryLine::new(num_bins)).collect(),
            head: 0,
            len: 0,
            num_bins,
        }
    }

    pub fn depth(&self) -> usize {
        self.lines.len()
    }

    pub fn frames_present(&self) -> usize {
        self.len
    }

    pub fn is_full(&self) -> bool {
        self.len == self.depth()
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Slot for a new newest frame, evicting the oldest one when full.
    pub fn push_evict(&mut self) -> &mut HistoryLine {
        let depth = self.depth();
        let idx = if self.len < depth {
            let idx = (self.head + self.len) % depth;
            self.len += 1;
            idx
        } else {
            let idx = self.head;
            self.head = (self.head + 1) % depth;
            idx
        };
        &mut self.lines[idx]
    }

    /// Frame `age` pushes ago (0 = newest).
    pub fn get(&self, age: usize) -> Option<&HistoryLine> {
        if age >= self.len {
            return None;
        }
        let idx = (self.head + self.len - 1 - age) % self.depth();
        Some(&self.lines[idx])
    }

    /// Changes the depth, keeping the newest frames.
    pub fn set_depth(&mut self, depth: usize) {
        let keep = self.len.min(depth);
        self.lines.rotate_left(self.head);
        self.lines.drain(..self.len - keep);
        let num_bins = self.num_bins;
        self.lines.resize_with(depth, || HistoryLine::new(num_bins));
        self.head = 0;
        self.len = keep;
    }

    /// Resizes every slot to `num_bins` and drops all frames.
    pub fn set_num_bins(&mut self, num_bins: usize) {
        for line in &mut self.lines {
            line.resize(num_bins);
        }
        self.num_bins = num_bins;
        self.clear();
    }
}

// =============================================================================
// Soft Masking
// =============================================================================

pub struct WienerSoftMasking {
    buffer_size: usize,
    overlap: usize,
    history_size: usize,
    processing_enabled: bool,
    gain_exponent: f32,

    /// Weights over history slots, oldest first.
    window: Vec<f32>,
    history: SpectralHistory,

    sigma2_mask0: Vec<f32>,
    sigma2_mask1: Vec<f32>,
}

impl WienerSoftMasking {
    pub fn new(buffer_size: usize, overlap: usize, history_size: usize) -> Result<Self, DspError> {
        Self::from_config(&WienerConfig {
            buffer_size,
            overlap,
            history_size,
            ..WienerConfig::default()
        })
    }

    pub fn from_config(cfg: &WienerConfig) -> Result<Self, DspError> {
        if let Err(e) = cfg.validate() {
            log::warn!("rejecting Wiener masking configuration {cfg:?}: {e}");
            return Err(e);
        }
        let num_bins = cfg.buffer_size / 2 + 1;
        Ok(Self {
            buffer_size: cfg.buffer_size,
            overlap: cfg.overlap,
            history_size: cfg.history_size,
            processing_enabled: true,
            gain_exponent: cfg.gain_exponent,
            window: make_open_hann_weights(cfg.history_size),
            history: SpectralHistory::new(cfg.history_size, num_bins),
            sigma2_mask0: vec![0.0; num_bins],
            sigma2_mask1: vec![0.0; num_bins],
        })
    }

    /// Drops accumulated history and recomputes the centering window.
    pub fn reset(&mut self) {
        self.history.clear();
        self.window = make_open_hann_weights(self.history_size);
        self.sigma2_mask0.fill(0.0);
        self.sigma2_mask1.fill(0.0);
    }

    /// Like [`reset`](Self::reset), for a new framing. History depth is kept.
    pub fn reset_with(&mut self, buffer_size: usize, overlap: usize) -> Result<(), DspError> {
        if let Err(e) = validate_framing(buffer_size, overlap) {
            log::warn!("rejecting Wiener framing {buffer_size}/{overlap}: {e}");
            return Err(e);
        }
        self.buffer_size = buffer_size;
        self.overlap = overlap;

        let num_bins = buffer_size / 2 + 1;
        if num_bins != self.history.num_bins() {
            log::info!("reallocating Wiener history for {num_bins} bins");
            self.history.set_num_bins(num_bins);
            self.sigma2_mask0.resize(num_bins, 0.0);
            self.sigma2_mask1.resize(num_bins, 0.0);
        }
        self.reset();
        Ok(())
    }

    /// Changes the window depth; shrinking evicts the oldest frames.
    pub fn set_history_size(&mut self, history_size: usize) -> Result<(), DspError> {
        if history_size == 0 {
            log::warn!("rejecting Wiener history size of zero");
            return Err(DspError::InvalidHistorySize(history_size));
        }
        if history_size != self.history_size {
            self.history.set_depth(history_size);
            self.history_size = history_size;
            self.window = make_open_hann_weights(history_size);
        }
        Ok(())
    }

    pub fn set_processing_enabled(&mut self, enabled: bool) {
        self.processing_enabled = enabled;
    }

    pub fn is_processing_enabled(&self) -> bool {
        self.processing_enabled
    }

    pub fn set_gain_exponent(&mut self, exponent: f32) -> Result<(), DspError> {
        if let Err(e) = check_gain_exponent(exponent) {
            log::warn!("rejecting Wiener gain exponent: {e}");
            return Err(e);
        }
        self.gain_exponent = exponent;
        Ok(())
    }

    pub fn gain_exponent(&self) -> f32 {
        self.gain_exponent
    }

    pub fn hop_size(&self) -> usize {
        self.buffer_size / self.overlap
    }

    pub fn num_bins(&self) -> usize {
        self.history.num_bins()
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    pub fn frames_present(&self) -> usize {
        self.history.frames_present()
    }

    pub fn history(&self) -> &SpectralHistory {
        &self.history
    }

    /// Delay of the centred outputs, in samples.
    pub fn latency(&self) -> usize {
        self.center_age() * self.hop_size()
    }

    /// Smoothed powers from the last active call: (denoised, residual).
    pub fn sigma2(&self) -> (&[f32], &[f32]) {
        (&self.sigma2_mask0, &self.sigma2_mask1)
    }

    #[inline]
    fn center_age(&self) -> usize {
        self.history_size / 2
    }

    /// Processes one frame.
    ///
    /// * `io_sum` - mixture spectrum in, centre mixture frame out
    /// * `mask` - soft gain per bin for the denoised component
    /// * `io_masked_result0` - denoised centre frame
    /// * `io_masked_result1` - residual centre frame (`io_sum - result0`)
    pub fn process_centered(
        &mut self,
        io_sum: &mut [Complex<f32>],
        mask: &[f32],
        io_masked_result0: &mut [Complex<f32>],
        io_masked_result1: Option<&mut [Complex<f32>]>,
    ) -> Result<(), DspError> {
        if let Err(e) = self.check_frame(io_sum, mask, io_masked_result0, io_masked_result1.as_deref()) {
            vx_log!("wiener: frame rejected: {}", e);
            return Err(e);
        }

        let line = self.history.push_evict();
        for (i, &x) in io_sum.iter().enumerate() {
            let m = mask[i].clamp(0.0, 1.0);
            line.sum[i] = x;
            line.masked0_square[i] = (x * m).norm_sqr();
            line.masked1_square[i] = (x * (1.0 - m)).norm_sqr();
        }

        match self.history.get(self.center_age()) {
            Some(center) => io_sum.copy_from_slice(&center.sum),
            None => io_sum.fill(Complex::new(0.0, 0.0)),
        }

        if !self.processing_enabled {
            io_masked_result0.copy_from_slice(io_sum);
            if let Some(res1) = io_masked_result1 {
                res1.fill(Complex::new(0.0, 0.0));
            }
            return Ok(());
        }

        self.estimate_sigma2();

        let p = self.gain_exponent;
        for (i, &c) in io_sum.iter().enumerate() {
            let (s0, s1) = (self.sigma2_mask0[i], self.sigma2_mask1[i]);
            let (p0, p1) = if p == 1.0 {
                (s0, s1)
            } else {
                (s0.powf(p), s1.powf(p))
            };
            let den = p0 + p1;
            let gain = if den > POWER_EPS { p0 / den } else { 0.0 };
            io_masked_result0[i] = c * gain;
        }

        if let Some(res1) = io_masked_result1 {
            for ((r1, &c), &r0) in res1.iter_mut().zip(io_sum.iter()).zip(io_masked_result0.iter()) {
                *r1 = c - r0;
            }
        }
        Ok(())
    }

    fn check_frame(
        &self,
        io_sum: &[Complex<f32>],
        mask: &[f32],
        res0: &[Complex<f32>],
        res1: Option<&[Complex<f32>]>,
    ) -> Result<(), DspError> {
        let n = self.num_bins();
        check_len("wiener mixture", n, io_sum.len())?;
        check_len("wiener mask", n, mask.len())?;
        check_len("wiener denoised output", n, res0.len())?;
        if let Some(res1) = res1 {
            check_len("wiener residual output", n, res1.len())?;
        }
        Ok(())
    }

    /// Window-weighted mean of both power accumulators over the frames
    /// currently present.
    fn estimate_sigma2(&mut self) {
        self.sigma2_mask0.fill(0.0);
        self.sigma2_mask1.fill(0.0);

        let present = self.history.frames_present();
        let mut weight_sum = 0.0f32;
        for age in 0..present {
            let w = self.window[self.history_size - 1 - age];
            weight_sum += w;
            if let Some(line) = self.history.get(age) {
                for (acc, &v) in self.sigma2_mask0.iter_mut().zip(&line.masked0_square) {
                    *acc += w * v;
                }
                for (acc, &v) in self.sigma2_mask1.iter_mut().zip(&line.masked1_square) {
                    *acc += w * v;
                }
            }
        }

        if weight_sum > 0.0 {
            let inv = 1.0 / weight_sum;
            for v in self.sigma2_mask0.iter_mut().chain(self.sigma2_mask1.iter_mut()) {
                *v *= inv;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUF: usize = 16;
    const BINS: usize = BUF / 2 + 1;

    fn frame(value: f32) -> Vec<Complex<f32>> {
        (0..BINS).map(|i| Complex::new(value, 0.1 * i as f32)).collect()
    }

    fn power(x: &[Complex<f32>]) -> f32 {
        x.iter().map(|c| c.norm_sqr()).sum()
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert_eq!(
            WienerSoftMasking::new(0, 4, 5).err(),
            Some(DspError::InvalidBufferSize(0))
        );
        assert!(matches!(
            WienerSoftMasking::new(16, 3, 5),
            Err(DspError::InvalidOverlap { .. })
        ));
        assert_eq!(
            WienerSoftMasking::new(16, 4, 0).err(),
            Some(DspError::InvalidHistorySize(0))
        );
    }

    #[test]
    fn test_latency_tracks_center_frame() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        assert_eq!(w.hop_size(), 4);
        assert_eq!(w.latency(), 8);
        w.set_history_size(3).unwrap();
        assert_eq!(w.latency(), 4);
        w.set_history_size(1).unwrap();
        assert_eq!(w.latency(), 0);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        let mut sum = frame(1.0);
        let mask = vec![0.5; BINS - 1];
        let mut out = vec![Complex::new(0.0, 0.0); BINS];
        assert!(matches!(
            w.process_centered(&mut sum, &mask, &mut out, None),
            Err(DspError::SizeMismatch { .. })
        ));
        assert_eq!(w.frames_present(), 0);
    }

    #[test]
    fn test_bypass_is_bit_identical() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        w.set_processing_enabled(false);
        let mask = vec![0.3; BINS];
        let mut out0 = vec![Complex::new(9.0, 9.0); BINS];
        let mut out1 = vec![Complex::new(9.0, 9.0); BINS];
        for t in 0..10 {
            let mut sum = frame(t as f32 + 1.0);
            w.process_centered(&mut sum, &mask, &mut out0, Some(&mut out1)).unwrap();
            assert_eq!(out0, sum);
            assert!(out1.iter().all(|c| c.re == 0.0 && c.im == 0.0));
        }
    }

    #[test]
    fn test_outputs_are_delayed_to_center_frame() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        let mask = vec![1.0; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        for t in 0..8 {
            let mut sum = frame(t as f32 + 1.0);
            w.process_centered(&mut sum, &mask, &mut out0, None).unwrap();
            if t < 2 {
                assert_eq!(power(&sum), 0.0);
            } else {
                assert_eq!(sum, frame((t - 2) as f32 + 1.0));
            }
        }
    }

    #[test]
    fn test_zero_mask_silences_denoised_output() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        let mask = vec![0.0; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        let mut out1 = vec![Complex::new(0.0, 0.0); BINS];
        for t in 0..12 {
            let mut sum = frame(1.0 + (t % 3) as f32);
            w.process_centered(&mut sum, &mask, &mut out0, Some(&mut out1)).unwrap();
            assert!(power(&out0) < 1e-12);
            assert!((power(&out1) - power(&sum)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_unit_mask_silences_residual() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        let mask = vec![1.0; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        let mut out1 = vec![Complex::new(0.0, 0.0); BINS];
        for t in 0..12 {
            let mut sum = frame(2.0 - (t % 2) as f32);
            w.process_centered(&mut sum, &mask, &mut out0, Some(&mut out1)).unwrap();
            assert!(power(&out1) < 1e-12);
            assert!((power(&out0) - power(&sum)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_partial_history_averages_present_frames_only() {
        let mut w = WienerSoftMasking::new(BUF, 4, 4).unwrap();
        let mut sum = vec![Complex::new(2.0, 0.0); BINS];
        let mask = vec![1.0; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        w.process_centered(&mut sum, &mask, &mut out0, None).unwrap();

        let (s0, s1) = w.sigma2();
        for v in s0 {
            assert!((v - 4.0).abs() < 1e-5);
        }
        assert!(s1.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_smoothed_gain_sits_between_instant_masks() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        let mut out1 = vec![Complex::new(0.0, 0.0); BINS];
        for t in 0..10 {
            let m = if t % 2 == 0 { 0.9 } else { 0.1 };
            let mask = vec![m; BINS];
            let mut sum = vec![Complex::new(1.0, 0.0); BINS];
            w.process_centered(&mut sum, &mask, &mut out0, Some(&mut out1)).unwrap();
            if t >= 4 {
                let g = out0[0].re;
                assert!(g > 0.15 && g < 0.85, "gain {g} at frame {t}");
                assert!((out0[0] + out1[0] - sum[0]).norm() < 1e-6);
            }
        }
    }

    #[test]
    fn test_shrinking_history_keeps_newest_frames() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        let mask = vec![0.5; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        for t in 0..7 {
            let mut sum = frame(t as f32 + 1.0);
            w.process_centered(&mut sum, &mask, &mut out0, None).unwrap();
        }
        w.set_history_size(3).unwrap();
        assert_eq!(w.frames_present(), 3);
        assert_eq!(w.history().get(0).unwrap().sum[0].re, 7.0);
        assert_eq!(w.history().get(2).unwrap().sum[0].re, 5.0);

        w.set_history_size(6).unwrap();
        assert_eq!(w.frames_present(), 3);
        assert_eq!(w.history().depth(), 6);
        assert!(!w.history().is_full());
    }

    #[test]
    fn test_reset_with_new_framing() {
        let mut w = WienerSoftMasking::new(BUF, 4, 3).unwrap();
        let mask = vec![0.5; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        let mut sum = frame(1.0);
        w.process_centered(&mut sum, &mask, &mut out0, None).unwrap();
        assert_eq!(w.frames_present(), 1);

        w.reset_with(32, 2).unwrap();
        assert_eq!(w.frames_present(), 0);
        assert_eq!(w.num_bins(), 17);
        assert_eq!(w.latency(), 16);

        let mut sum = vec![Complex::new(1.0, 0.0); 17];
        let mask = vec![0.5; 17];
        let mut out0 = vec![Complex::new(0.0, 0.0); 17];
        assert!(w.process_centered(&mut sum, &mask, &mut out0, None).is_ok());
        assert!(w.reset_with(32, 5).is_err());
    }

    #[test]
    fn test_zero_history_size_rejected() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        assert_eq!(
            w.set_history_size(0),
            Err(DspError::InvalidHistorySize(0))
        );
        assert_eq!(w.history_size(), 5);
        assert_eq!(w.latency(), 8);
    }

    #[test]
    fn test_reset_clears_history_keeps_depth() {
        let mut w = WienerSoftMasking::new(BUF, 4, 5).unwrap();
        let mask = vec![0.5; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        for t in 0..4 {
            let mut sum = frame(t as f32 + 1.0);
            w.process_centered(&mut sum, &mask, &mut out0, None).unwrap();
        }
        assert_eq!(w.frames_present(), 4);

        w.reset();
        assert_eq!(w.frames_present(), 0);
        assert_eq!(w.history().depth(), 5);
        assert_eq!(w.history_size(), 5);
        assert_eq!(w.latency(), 8);
        let (s0, s1) = w.sigma2();
        assert!(s0.iter().chain(s1).all(|&v| v == 0.0));

        // Centre frame is gone, so output is silent again.
        let mut sum = frame(9.0);
        w.process_centered(&mut sum, &mask, &mut out0, None).unwrap();
        assert_eq!(power(&sum), 0.0);
    }

    #[test]
    fn test_invalid_gain_exponent_rejected() {
        for p in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let cfg = WienerConfig {
                gain_exponent: p,
                ..WienerConfig::default()
            };
            assert!(matches!(
                WienerSoftMasking::from_config(&cfg),
                Err(DspError::InvalidGainExponent(_))
            ));
        }

        let mut w = WienerSoftMasking::new(BUF, 4, 1).unwrap();
        assert!(w.set_gain_exponent(-1.0).is_err());
        assert_eq!(w.gain_exponent(), 1.0);
        assert!(w.set_gain_exponent(2.0).is_ok());

        // Zero mask stays finite and silent with any accepted exponent.
        let mask = vec![0.0; BINS];
        let mut out0 = vec![Complex::new(0.0, 0.0); BINS];
        let mut sum = frame(1.0);
        w.process_centered(&mut sum, &mask, &mut out0, None).unwrap();
        assert!(out0.iter().all(|c| c.re == 0.0 && c.im == 0.0));
    }

    #[test]
    fn test_history_push_evict_order() {
        let mut h = SpectralHistory::new(3, 1);
        for v in 1..=5 {
            h.push_evict().sum[0] = Complex::new(v as f32, 0.0);
        }
        assert!(h.is_full());
        let ages: Vec<f32> = (0..3).map(|a| h.get(a).unwrap().sum[0].re).collect();
        assert_eq!(ages, vec![5.0, 4.0, 3.0]);
        assert!(h.get(3).is_none());
    }
}
