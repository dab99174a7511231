//! Tracked Sinusoidal Partial
//!
//! One sinusoidal component followed across spectral frames. A partial is a
//! plain value: copying it duplicates its smoothing state, and ids are only
//! drawn from a [`PartialIdAllocator`] when the owning tracker decides a
//! partial is logically new.
//!
//! # Lifecycle
//! - **Alive**: observed in the current frame (initial state).
//! - **Zombie**: missed, but retained to bridge short detection gaps.
//! - **Dead**: terminal, the tracker may drop it.
//!
//! The tracker owns the transition decisions. [`Partial::mark_observed`] and
//! [`Partial::mark_missed`] implement the usual policy for trackers that want
//! it; `age` counts every frame the partial exists regardless of state.
//!
//! # Amplitude
//! Amplitude is a tagged [`Amplitude`] value so a linear magnitude can never be
//! read as decibels (or the reverse) by a later stage.

use crate::dsp::kalman::{KalmanParams, ScalarKalmanFilter};
use crate::dsp::utils::{db_to_gain, gain_to_db};
use crate::error::DspError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// =============================================================================
// Identity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartialId(pub u64);

/// Monotonic id source owned by whoever creates partials.
#[derive(Debug, Clone, Default)]
pub struct PartialIdAllocator {
    next: u64,
}

impl PartialIdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocator whose first id is `first`. Handy for deterministic tests.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> PartialId {
        let id = PartialId(self.next);
        self.next += 1;
        id
    }

    /// Id the next call to `next_id` will hand out.
    pub fn peek_next(&self) -> PartialId {
        PartialId(self.next)
    }
}

// =============================================================================
// State & Amplitude
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialState {
    #[default]
    Alive,
    Zombie,
    Dead,
}

/// How many consecutive missed frames a zombie survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZombiePolicy {
    pub max_zombie_age: u32,
}

impl Default for ZombiePolicy {
    fn default() -> Self {
        Self { max_zombie_age: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amplitude {
    /// Linear magnitude (normalized spectrum units).
    Linear(f32),
    /// Level in dB.
    Decibels(f32),
}

impl Default for Amplitude {
    fn default() -> Self {
        Amplitude::Linear(0.0)
    }
}

impl Amplitude {
    pub fn to_linear(self) -> f32 {
        match self {
            Amplitude::Linear(v) => v,
            Amplitude::Decibels(db) => db_to_gain(db),
        }
    }

    pub fn to_db(self) -> f32 {
        match self {
            Amplitude::Linear(v) => gain_to_db(v),
            Amplitude::Decibels(db) => db,
        }
    }

    pub fn as_linear(self) -> Amplitude {
        Amplitude::Linear(self.to_linear())
    }

    pub fn as_db(self) -> Amplitude {
        Amplitude::Decibels(self.to_db())
    }
}

// =============================================================================
// QIFFT
// =============================================================================

/// Parabola fitted through the log-magnitudes of a peak bin and its two
/// neighbours: `y(x) = a*x^2 + b*x + c`, with `x` in bins relative to the
/// peak bin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Qifft {
    /// Refined peak position in (fractional) bins.
    pub bin_idx_f: f32,
    /// Vertex offset from the integer peak bin, in `[-0.5, 0.5]`.
    pub offset: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl Qifft {
    /// Fits the three dB values around `peak`. Returns `None` when the peak
    /// has no neighbour on one side.
    pub fn fit(magns_db: &[f32], peak: usize) -> Option<Self> {
        if peak == 0 || peak + 1 >= magns_db.len() {
            return None;
        }
        let alpha = magns_db[peak - 1];
        let beta = magns_db[peak];
        let gamma = magns_db[peak + 1];

        let a = 0.5 * (alpha - 2.0 * beta + gamma);
        let b = 0.5 * (gamma - alpha);
        let c = beta;

        // Not a local maximum: keep the integer bin.
        let offset = if a < 0.0 {
            (-b / (2.0 * a)).clamp(-0.5, 0.5)
        } else {
            0.0
        };

        Some(Self {
            bin_idx_f: peak as f32 + offset,
            offset,
            a,
            b,
            c,
        })
    }

    /// Interpolated level at the refined position.
    pub fn peak_db(&self) -> f32 {
        let x = self.offset;
        self.a * x * x + self.b * x + self.c
    }
}

// =============================================================================
// Partial
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Partial {
    pub id: Option<PartialId>,
    /// Partial this one continued from in the previous frame.
    pub linked_id: Option<PartialId>,

    pub peak_index: usize,
    pub left_index: usize,
    pub right_index: usize,

    pub freq: f32,
    pub amp: Amplitude,
    pub phase: f32,

    pub qifft: Qifft,

    pub state: PartialState,
    pub was_alive: bool,
    pub zombie_age: u32,
    pub age: u32,

    /// Free slot for tracker-specific sort passes.
    pub cookie: f32,

    smoothing: ScalarKalmanFilter,
    smoothed_freq: f32,
}

impl Default for Partial {
    fn default() -> Self {
        Self::new(KalmanParams::default())
    }
}

impl Partial {
    pub fn new(smoothing: KalmanParams) -> Self {
        Self {
            id: None,
            linked_id: None,
            peak_index: 0,
            left_index: 0,
            right_index: 0,
            freq: 0.0,
            amp: Amplitude::default(),
            phase: 0.0,
            qifft: Qifft::default(),
            state: PartialState::Alive,
            was_alive: false,
            zombie_age: 0,
            age: 0,
            cookie: 0.0,
            smoothing: ScalarKalmanFilter::from_params(smoothing),
            smoothed_freq: 0.0,
        }
    }

    /// Assigns a fresh id. Call once per logically new partial, never on copies.
    pub fn gen_new_id(&mut self, ids: &mut PartialIdAllocator) -> PartialId {
        let id = ids.next_id();
        self.id = Some(id);
        id
    }

    /// Refines `peak_index` with the parabola through its neighbours,
    /// updating the fractional bin, frequency and dB amplitude.
    pub fn refine_qifft(
        &mut self,
        magns_db: &[f32],
        sample_rate: f32,
        fft_size: usize,
    ) -> Result<(), DspError> {
        crate::error::check_sample_rate(sample_rate)?;
        if fft_size == 0 {
            return Err(DspError::InvalidBufferSize(fft_size));
        }
        if self.peak_index >= magns_db.len() {
            return Err(DspError::SizeMismatch {
                what: "qifft magnitudes",
                expected: self.peak_index + 1,
                actual: magns_db.len(),
            });
        }

        let hz_per_bin = sample_rate / fft_size as f32;
        match Qifft::fit(magns_db, self.peak_index) {
            Some(fit) => {
                self.qifft = fit;
                self.freq = fit.bin_idx_f * hz_per_bin;
                self.amp = Amplitude::Decibels(fit.peak_db());
            }
            None => {
                let level = magns_db[self.peak_index];
                self.qifft = Qifft {
                    bin_idx_f: self.peak_index as f32,
                    offset: 0.0,
                    a: 0.0,
                    b: 0.0,
                    c: level,
                };
                self.freq = self.peak_index as f32 * hz_per_bin;
                self.amp = Amplitude::Decibels(level);
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Frequency smoothing
    // -------------------------------------------------------------------------

    /// Seeds the smoother with the current frequency.
    pub fn init_smoothing(&mut self) {
        self.smoothing.init_estimate(self.freq);
        self.smoothed_freq = self.freq;
    }

    /// Feeds the current frequency through the smoother.
    pub fn smooth_freq(&mut self) -> f32 {
        self.smoothed_freq = self.smoothing.update_estimate(self.freq);
        self.smoothed_freq
    }

    pub fn smoothed_freq(&self) -> f32 {
        self.smoothed_freq
    }

    pub fn set_smoothing_params(&mut self, params: KalmanParams) {
        self.smoothing.set_params(params);
    }

    pub fn smoothing(&self) -> &ScalarKalmanFilter {
        &self.smoothing
    }

    // -------------------------------------------------------------------------
    // Lifecycle helpers
    // -------------------------------------------------------------------------

    pub fn is_alive(&self) -> bool {
        self.state == PartialState::Alive
    }

    pub fn is_dead(&self) -> bool {
        self.state == PartialState::Dead
    }

    /// Counts one more frame of existence.
    pub fn tick_age(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    /// Partial matched again in this frame. Dead partials stay dead.
    pub fn mark_observed(&mut self) {
        if self.state == PartialState::Dead {
            return;
        }
        self.zombie_age = 0;
        self.state = PartialState::Alive;
        self.was_alive = true;
    }

    /// Partial not matched in this frame.
    pub fn mark_missed(&mut self, policy: &ZombiePolicy) {
        match self.state {
            PartialState::Alive => {
                self.was_alive = true;
                self.zombie_age = 1;
                self.state = PartialState::Zombie;
            }
            PartialState::Zombie => {
                self.zombie_age = self.zombie_age.saturating_add(1);
                if self.zombie_age > policy.max_zombie_age {
                    self.state = PartialState::Dead;
                }
            }
            PartialState::Dead => {}
        }
    }
}

// =============================================================================
// Comparators
// =============================================================================

pub fn cmp_freq(a: &Partial, b: &Partial) -> Ordering {
    a.freq.total_cmp(&b.freq)
}

pub fn cmp_amp(a: &Partial, b: &Partial) -> Ordering {
    a.amp.to_db().total_cmp(&b.amp.to_db())
}

/// Partials without an id sort first.
pub fn cmp_id(a: &Partial, b: &Partial) -> Ordering {
    a.id.cmp(&b.id)
}

pub fn cmp_cookie(a: &Partial, b: &Partial) -> Ordering {
    a.cookie.total_cmp(&b.cookie)
}

pub fn sort_by_freq(partials: &mut [Partial]) {
    partials.sort_unstable_by(cmp_freq);
}

pub fn sort_by_amp(partials: &mut [Partial]) {
    partials.sort_unstable_by(cmp_amp);
}

pub fn sort_by_id(partials: &mut [Partial]) {
    partials.sort_unstable_by(cmp_id);
}

pub fn sort_by_cookie(partials: &mut [Partial]) {
    partials.sort_unstable_by(cmp_cookie);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_increasing() {
        let mut ids = PartialIdAllocator::starting_at(100);
        let mut partials: Vec<Partial> = (0..16).map(|_| Partial::default()).collect();
        let got: Vec<PartialId> = partials.iter_mut().map(|p| p.gen_new_id(&mut ids)).collect();
        for pair in got.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(got[0], PartialId(100));
        assert_eq!(ids.peek_next(), PartialId(116));
    }

    #[test]
    fn test_copy_keeps_id_and_smoothing_state() {
        let mut ids = PartialIdAllocator::new();
        let mut p = Partial::default();
        p.gen_new_id(&mut ids);
        p.freq = 440.0;
        p.init_smoothing();
        p.freq = 442.0;
        p.smooth_freq();

        let mut copy = p;
        assert_eq!(copy.id, p.id);
        assert_eq!(copy.smoothing(), p.smoothing());
        copy.smooth_freq();
        assert_ne!(copy.smoothing(), p.smoothing());
    }

    #[test]
    fn test_lifecycle_alive_zombie_dead() {
        let policy = ZombiePolicy { max_zombie_age: 2 };
        let mut p = Partial::default();
        assert!(p.is_alive());
        assert!(!p.was_alive);

        // Born alive, then missed: it still counts as having been alive.
        p.mark_missed(&policy);
        assert_eq!(p.state, PartialState::Zombie);
        assert_eq!(p.zombie_age, 1);
        assert!(p.was_alive);

        p.mark_observed();
        assert_eq!(p.state, PartialState::Alive);
        assert_eq!(p.zombie_age, 0);
        assert!(p.was_alive);

        p.mark_missed(&policy);
        p.mark_missed(&policy);
        assert_eq!(p.state, PartialState::Zombie);
        p.mark_missed(&policy);
        assert!(p.is_dead());

        p.mark_observed();
        assert!(p.is_dead());
    }

    #[test]
    fn test_age_counts_every_frame() {
        let policy = ZombiePolicy::default();
        let mut p = Partial::default();
        for frame in 0..6 {
            p.tick_age();
            if frame % 2 == 0 {
                p.mark_missed(&policy);
            } else {
                p.mark_observed();
            }
        }
        assert_eq!(p.age, 6);
    }

    #[test]
    fn test_amplitude_units() {
        let a = Amplitude::Linear(0.5);
        assert!((a.to_db() + 6.0206).abs() < 1e-3);
        let d = Amplitude::Decibels(-20.0);
        assert!((d.to_linear() - 0.1).abs() < 1e-6);
        assert_eq!(Amplitude::Decibels(-3.0).as_db(), Amplitude::Decibels(-3.0));
    }

    #[test]
    fn test_qifft_recovers_parabola_vertex() {
        // y = -2 (x - 0.3)^2 + 10, sampled at bins 4, 5, 6 around peak 5
        let f = |x: f32| -2.0 * (x - 5.3) * (x - 5.3) + 10.0;
        let magns_db = [0.0, 0.0, 0.0, 0.0, f(4.0), f(5.0), f(6.0), 0.0];
        let mut p = Partial::default();
        p.peak_index = 5;
        p.refine_qifft(&magns_db, 48000.0, 1024).unwrap();

        assert!((p.qifft.bin_idx_f - 5.3).abs() < 1e-4);
        assert!((p.amp.to_db() - 10.0).abs() < 1e-3);
        assert!((p.freq - 5.3 * 48000.0 / 1024.0).abs() < 0.01);
    }

    #[test]
    fn test_qifft_edge_peak_uses_integer_bin() {
        let magns_db = [3.0, 1.0, 0.0];
        let mut p = Partial::default();
        p.peak_index = 0;
        p.refine_qifft(&magns_db, 1000.0, 4).unwrap();
        assert_eq!(p.qifft.bin_idx_f, 0.0);
        assert_eq!(p.amp, Amplitude::Decibels(3.0));

        p.peak_index = 9;
        assert!(p.refine_qifft(&magns_db, 1000.0, 4).is_err());
    }

    #[test]
    fn test_smoothing_tracks_towards_measurement() {
        let mut p = Partial::new(KalmanParams {
            measurement_error: 0.03,
            estimate_error: 0.03,
            process_noise: 0.5,
        });
        p.freq = 1000.0;
        p.init_smoothing();
        p.freq = 1010.0;
        let s = p.smooth_freq();
        assert!(s > 1000.0 && s < 1010.0);
        assert_eq!(p.smoothed_freq(), s);
    }

    #[test]
    fn test_sorting_helpers() {
        let mut ids = PartialIdAllocator::new();
        let mut parts: Vec<Partial> = [300.0, 100.0, 200.0]
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let mut p = Partial::default();
                p.gen_new_id(&mut ids);
                p.freq = f;
                p.amp = Amplitude::Decibels(-(i as f32) * 10.0);
                p.cookie = f * -1.0;
                p
            })
            .collect();

        sort_by_freq(&mut parts);
        assert_eq!(parts.iter().map(|p| p.freq).collect::<Vec<_>>(), vec![100.0, 200.0, 300.0]);

        sort_by_amp(&mut parts);
        assert_eq!(parts[2].freq, 300.0);

        sort_by_cookie(&mut parts);
        assert_eq!(parts[0].freq, 300.0);

        sort_by_id(&mut parts);
        assert_eq!(parts[0].id, Some(PartialId(0)));
        assert_eq!(parts[2].id, Some(PartialId(2)));
    }
}
