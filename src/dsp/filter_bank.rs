//! Perceptual Filter Bank
//!
//! Resamples linear-frequency magnitude spectra onto a target scale (Mel,
//! Bark, ...) and back, with a size change as a side effect.
//!
//! # Forward (Hz -> target)
//! `num_filters` overlapping triangles are spaced evenly on the target scale
//! between 0 Hz and Nyquist. Each triangle's base points and apex are mapped
//! back to fractional FFT bins; a bin's weight is the triangle area falling
//! inside that bin, normalized so every filter sums to one. Triangles
//! narrower than one bin are widened by [`fix_small_triangles`].
//!
//! # Inverse (target -> Hz)
//! Each target value is spread back over the bins between its neighbours'
//! apexes with a unit-height hat. Adjacent hats sum to one, so this is a
//! triangular overlap-add (linear interpolation) back to linear frequency.
//! Bins below the first apex and above the last one take the edge value.
//!
//! # Caching
//! Building is the expensive part and allocates. [`FilterBank`] keeps one
//! [`FilterBankCache`] per direction, keyed by [`FilterBankKey`], and only
//! rebuilds when the key changes. Projection through a cached bank does not
//! allocate.

use crate::dsp::frequency_scale::{FrequencyScale, Scale};
use crate::error::{check_len, check_sample_rate, DspError};

/// Narrowest forward triangle base, in bins.
const MIN_TRIANGLE_WIDTH_BINS: f32 = 1.0;
// Guard for slopes of near-coincident points.
const SLOPE_EPS: f32 = 1e-9;
// Weight sums below this are left un-normalized.
const WEIGHT_SUM_EPS: f32 = 1e-12;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterBankKey {
    /// Number of linear-frequency bins (`fft_size / 2 + 1`).
    pub data_size: usize,
    pub sample_rate: f32,
    pub num_filters: usize,
}

impl FilterBankKey {
    pub fn new(data_size: usize, sample_rate: f32, num_filters: usize) -> Self {
        Self {
            data_size,
            sample_rate,
            num_filters,
        }
    }

    pub fn validate(&self) -> Result<(), DspError> {
        if self.num_filters == 0 {
            return Err(DspError::InvalidFilterCount(self.num_filters));
        }
        if self.data_size <= 1 {
            return Err(DspError::InvalidDataSize(self.data_size));
        }
        check_sample_rate(self.sample_rate)
    }

    fn hz_per_bin(&self) -> f32 {
        self.sample_rate * 0.5 / (self.data_size - 1) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HzToTarget,
    TargetToHz,
}

/// One triangle: weights for the inclusive bin range `bounds[0]..=bounds[1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub weights: Vec<f32>,
    pub bounds: [usize; 2],
}

impl Filter {
    pub fn span(&self) -> usize {
        self.bounds[1] - self.bounds[0] + 1
    }

    /// Weight applied to linear bin `bin` (zero outside the bounds).
    pub fn weight(&self, bin: usize) -> f32 {
        if bin < self.bounds[0] || bin > self.bounds[1] {
            return 0.0;
        }
        self.weights[bin - self.bounds[0]]
    }
}

/// Immutable filter bank for one direction and configuration.
#[derive(Debug, Clone)]
pub struct FilterBankObj {
    key: FilterBankKey,
    scale: Scale,
    direction: Direction,
    filters: Vec<Filter>,
}

impl FilterBankObj {
    pub fn build(scale: Scale, direction: Direction, key: FilterBankKey) -> Result<Self, DspError> {
        key.validate()?;
        let points = bin_points(&scale, &key);
        let filters = match direction {
            Direction::HzToTarget => build_hz_to_target(&points, &key),
            Direction::TargetToHz => build_target_to_hz(&points, &key),
        };
        Ok(Self {
            key,
            scale,
            direction,
            filters,
        })
    }

    pub fn key(&self) -> FilterBankKey {
        self.key
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn input_len(&self) -> usize {
        match self.direction {
            Direction::HzToTarget => self.key.data_size,
            Direction::TargetToHz => self.key.num_filters,
        }
    }

    pub fn output_len(&self) -> usize {
        match self.direction {
            Direction::HzToTarget => self.key.num_filters,
            Direction::TargetToHz => self.key.data_size,
        }
    }

    /// Projects `magns` through the bank into `result`.
    pub fn apply(&self, result: &mut [f32], magns: &[f32]) -> Result<(), DspError> {
        check_len("filter bank input", self.input_len(), magns.len())?;
        check_len("filter bank output", self.output_len(), result.len())?;

        match self.direction {
            Direction::HzToTarget => {
                for (out, filter) in result.iter_mut().zip(&self.filters) {
                    let bins = &magns[filter.bounds[0]..=filter.bounds[1]];
                    *out = filter.weights.iter().zip(bins).map(|(w, m)| w * m).sum();
                }
            }
            Direction::TargetToHz => {
                result.fill(0.0);
                for (&value, filter) in magns.iter().zip(&self.filters) {
                    let bins = &mut result[filter.bounds[0]..=filter.bounds[1]];
                    for (out, w) in bins.iter_mut().zip(&filter.weights) {
                        *out += w * value;
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Construction
// =============================================================================

/// `num_filters + 2` points evenly spaced on the target scale, as fractional
/// linear bins.
fn bin_points(scale: &Scale, key: &FilterBankKey) -> Vec<f32> {
    let (t_lo, t_hi) = scale.target_range(key.sample_rate);
    let nyquist = key.sample_rate * 0.5;
    let hz_per_bin = key.hz_per_bin();
    let max_bin = (key.data_size - 1) as f32;
    let steps = (key.num_filters + 1) as f32;

    (0..key.num_filters + 2)
        .map(|i| {
            let t = t_lo + (t_hi - t_lo) * i as f32 / steps;
            let hz = scale.target_to_hz(t).clamp(0.0, nyquist);
            (hz / hz_per_bin).clamp(0.0, max_bin)
        })
        .collect()
}

/// Widens a triangle whose base is narrower than one bin so it keeps a full
/// bin of support around its apex.
pub fn fix_small_triangles(fmin: &mut f32, fcenter: f32, fmax: &mut f32) {
    if *fmax - *fmin < MIN_TRIANGLE_WIDTH_BINS {
        let half = 0.5 * MIN_TRIANGLE_WIDTH_BINS;
        *fmin = fcenter - half;
        *fmax = fcenter + half;
    }
}

/// Area under a unit-height triangle `(lo, c, hi)` from `lo` up to `x`.
fn triangle_cdf(lo: f32, c: f32, hi: f32, x: f32) -> f32 {
    if x <= lo {
        0.0
    } else if x <= c {
        let w = c - lo;
        if w <= SLOPE_EPS {
            0.0
        } else {
            (x - lo) * (x - lo) / (2.0 * w)
        }
    } else if x < hi {
        let w = hi - c;
        0.5 * (c - lo) + 0.5 * w - (hi - x) * (hi - x) / (2.0 * w)
    } else {
        0.5 * (hi - lo)
    }
}

fn build_hz_to_target(points: &[f32], key: &FilterBankKey) -> Vec<Filter> {
    let max_bin = key.data_size - 1;

    (0..key.num_filters)
        .map(|m| {
            let mut fmin = points[m];
            let fcenter = points[m + 1];
            let mut fmax = points[m + 2];
            fix_small_triangles(&mut fmin, fcenter, &mut fmax);

            let first = ((fmin + 0.5).floor().max(0.0) as usize).min(max_bin);
            let last = ((fmax - 0.5).ceil().max(0.0) as usize).clamp(first, max_bin);

            let mut weights: Vec<f32> = (first..=last)
                .map(|bin| {
                    let b = bin as f32;
                    triangle_cdf(fmin, fcenter, fmax, b + 0.5)
                        - triangle_cdf(fmin, fcenter, fmax, b - 0.5)
                })
                .collect();

            let sum: f32 = weights.iter().sum();
            if sum > WEIGHT_SUM_EPS {
                for w in &mut weights {
                    *w /= sum;
                }
            }

            Filter {
                weights,
                bounds: [first, last],
            }
        })
        .collect()
}

fn build_target_to_hz(points: &[f32], key: &FilterBankKey) -> Vec<Filter> {
    let n = key.num_filters;
    let max_bin = key.data_size - 1;
    let centers = &points[1..=n];

    (0..n)
        .map(|m| {
            let c = centers[m];
            let left = if m == 0 { None } else { Some(centers[m - 1]) };
            let right = if m + 1 == n { None } else { Some(centers[m + 1]) };

            let hat = |x: f32| -> f32 {
                if x <= c {
                    match left {
                        None => 1.0,
                        Some(l) if x <= l => 0.0,
                        Some(l) => (x - l) / (c - l).max(SLOPE_EPS),
                    }
                } else {
                    match right {
                        None => 1.0,
                        Some(r) if x >= r => 0.0,
                        Some(r) => (r - x) / (r - c).max(SLOPE_EPS),
                    }
                }
            };

            let lo = left.unwrap_or(0.0);
            let hi = right.unwrap_or(max_bin as f32);
            let mut first = (lo.ceil().max(0.0) as usize).min(max_bin);
            let mut last = (hi.floor().max(0.0) as usize).min(max_bin);
            if first > last {
                // No bin between the neighbouring apexes: keep the nearest one.
                first = (c.round().max(0.0) as usize).min(max_bin);
                last = first;
            }

            Filter {
                weights: (first..=last).map(|bin| hat(bin as f32)).collect(),
                bounds: [first, last],
            }
        })
        .collect()
}

// =============================================================================
// Cache
// =============================================================================

/// Last-built filter bank for one direction, rebuilt only on key change.
#[derive(Debug, Clone)]
pub struct FilterBankCache {
    direction: Direction,
    bank: Option<FilterBankObj>,
    build_count: u64,
}

impl FilterBankCache {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            bank: None,
            build_count: 0,
        }
    }

    /// Returns the cached bank for `key`, building it first if the cached
    /// one was made for a different key or scale.
    pub fn get_or_build(&mut self, scale: Scale, key: FilterBankKey) -> Result<&FilterBankObj, DspError> {
        let stale = match &self.bank {
            Some(bank) => bank.key != key || bank.scale != scale,
            None => true,
        };
        if stale {
            if let Err(e) = key.validate() {
                log::warn!("rejecting filter bank configuration {key:?}: {e}");
                return Err(e);
            }
            log::debug!(
                "building {:?} {} filter bank: {} bins, {} Hz, {} filters",
                self.direction,
                scale.name(),
                key.data_size,
                key.sample_rate,
                key.num_filters
            );
            self.bank = Some(FilterBankObj::build(scale, self.direction, key)?);
            self.build_count += 1;
        }
        match &self.bank {
            Some(bank) => Ok(bank),
            None => Err(DspError::InvalidFilterCount(key.num_filters)),
        }
    }

    pub fn bank(&self) -> Option<&FilterBankObj> {
        self.bank.as_ref()
    }

    pub fn build_count(&self) -> u64 {
        self.build_count
    }

    pub fn invalidate(&mut self) {
        self.bank = None;
    }
}

// =============================================================================
// Filter Bank
// =============================================================================

/// Forward and inverse scale conversion with per-direction caching.
#[derive(Debug, Clone)]
pub struct FilterBank {
    scale: Scale,
    hz_to_target: FilterBankCache,
    target_to_hz: FilterBankCache,
}

impl Default for FilterBank {
    fn default() -> Self {
        Self::new(Scale::default())
    }
}

impl FilterBank {
    pub fn new(scale: Scale) -> Self {
        Self {
            scale,
            hz_to_target: FilterBankCache::new(Direction::HzToTarget),
            target_to_hz: FilterBankCache::new(Direction::TargetToHz),
        }
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Switching scale drops both cached banks.
    pub fn set_scale(&mut self, scale: Scale) {
        if scale != self.scale {
            self.scale = scale;
            self.hz_to_target.invalidate();
            self.target_to_hz.invalidate();
        }
    }

    /// Linear `magns` (`data_size` bins) to `num_filters` target-scale values.
    pub fn hz_to_target(
        &mut self,
        result: &mut [f32],
        magns: &[f32],
        sample_rate: f32,
        num_filters: usize,
    ) -> Result<(), DspError> {
        let key = FilterBankKey::new(magns.len(), sample_rate, num_filters);
        let bank = self.hz_to_target.get_or_build(self.scale, key)?;
        bank.apply(result, magns)
    }

    /// `num_filters` target-scale values back to `result.len()` linear bins.
    pub fn target_to_hz(
        &mut self,
        result: &mut [f32],
        magns: &[f32],
        sample_rate: f32,
        num_filters: usize,
    ) -> Result<(), DspError> {
        let key = FilterBankKey::new(result.len(), sample_rate, num_filters);
        let bank = self.target_to_hz.get_or_build(self.scale, key)?;
        bank.apply(result, magns)
    }

    pub fn hz_to_target_cache(&self) -> &FilterBankCache {
        &self.hz_to_target
    }

    pub fn target_to_hz_cache(&self) -> &FilterBankCache {
        &self.target_to_hz
    }
}
