//! Error taxonomy for the spectral core.
//!
//! Everything here is raised at configuration time or by a per-frame call
//! handed slices of the wrong length. Degenerate filter-bank geometry is not
//! an error: it is corrected in place while the bank is built.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DspError {
    /// Ring buffer capacity of zero.
    InvalidCapacity,
    /// Filter bank with no filters.
    InvalidFilterCount(usize),
    /// Linear-frequency vector too short to span a filter bank (needs > 1 bin).
    InvalidDataSize(usize),
    /// Sample rate that is zero, negative or not finite.
    InvalidSampleRate(f32),
    /// FFT buffer size of zero.
    InvalidBufferSize(usize),
    /// Overlap factor that does not divide the buffer into whole hops.
    InvalidOverlap { buffer_size: usize, overlap: usize },
    /// Wiener history depth of zero.
    InvalidHistorySize(usize),
    /// Wiener gain exponent that is zero, negative or not finite.
    InvalidGainExponent(f32),
    /// Caller-provided slice disagrees with the configured size.
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for DspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DspError::InvalidCapacity => write!(f, "ring buffer capacity must be greater than zero"),
            DspError::InvalidFilterCount(n) => {
                write!(f, "filter bank needs at least one filter, got {n}")
            }
            DspError::InvalidDataSize(n) => {
                write!(f, "filter bank needs more than one linear bin, got {n}")
            }
            DspError::InvalidSampleRate(sr) => write!(f, "invalid sample rate {sr}"),
            DspError::InvalidBufferSize(n) => write!(f, "invalid buffer size {n}"),
            DspError::InvalidOverlap {
                buffer_size,
                overlap,
            } => write!(
                f,
                "overlap {overlap} must be > 0 and divide buffer size {buffer_size}"
            ),
            DspError::InvalidHistorySize(n) => {
                write!(f, "history size must be at least 1, got {n}")
            }
            DspError::InvalidGainExponent(p) => {
                write!(f, "gain exponent must be finite and positive, got {p}")
            }
            DspError::SizeMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what}: expected length {expected}, got {actual}"),
        }
    }
}

impl std::error::Error for DspError {}

/// Rejects non-finite or non-positive sample rates.
pub(crate) fn check_sample_rate(sample_rate: f32) -> Result<(), DspError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(DspError::InvalidSampleRate(sample_rate))
    }
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), DspError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DspError::SizeMismatch {
            what,
            expected,
            actual,
        })
    }
}
