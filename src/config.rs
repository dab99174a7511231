//! JSON configuration for the spectral core.
//!
//! Every section has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "filter_bank": { "scale": "Bark", "num_filters": 24 },
//!   "wiener": { "history_size": 7 } }
//! ```

use crate::dsp::filter_bank::FilterBankKey;
use crate::dsp::frequency_scale::Scale;
use crate::dsp::kalman::KalmanParams;
use crate::dsp::partial::ZombiePolicy;
use crate::dsp::wiener_soft_masking::WienerConfig;
use crate::error::DspError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_NUM_FILTERS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterBankConfig {
    pub scale: Scale,
    pub num_filters: usize,
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            scale: Scale::default(),
            num_filters: DEFAULT_NUM_FILTERS,
        }
    }
}

impl FilterBankConfig {
    /// Cache key for spectra of `fft_size` at `sample_rate`.
    pub fn key(&self, fft_size: usize, sample_rate: f32) -> FilterBankKey {
        FilterBankKey::new(fft_size / 2 + 1, sample_rate, self.num_filters)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub filter_bank: FilterBankConfig,
    pub wiener: WienerConfig,
    pub smoothing: KalmanParams,
    pub lifecycle: ZombiePolicy,
}

impl CoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: CoreConfig = serde_json::from_str(json).context("parsing core config JSON")?;
        cfg.validate().context("validating core config")?;
        Ok(cfg)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("loading config {}", path.display()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing core config")
    }

    pub fn validate(&self) -> Result<(), DspError> {
        self.wiener.validate()?;
        // The bank must fit the spectra the masking stage produces.
        self.filter_bank.key(self.wiener.buffer_size, 1.0).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let cfg = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, CoreConfig::default());
        assert_eq!(cfg.filter_bank.scale, Scale::Mel);
        assert_eq!(cfg.wiener.history_size, 5);
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        let cfg = CoreConfig::from_json_str(
            r#"{ "filter_bank": { "scale": "Bark", "num_filters": 24 },
                 "wiener": { "history_size": 7, "gain_exponent": 2.0 },
                 "lifecycle": { "max_zombie_age": 4 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.filter_bank.scale, Scale::Bark);
        assert_eq!(cfg.filter_bank.num_filters, 24);
        assert_eq!(cfg.wiener.history_size, 7);
        assert_eq!(cfg.wiener.buffer_size, WienerConfig::default().buffer_size);
        assert_eq!(cfg.wiener.gain_exponent, 2.0);
        assert_eq!(cfg.lifecycle.max_zombie_age, 4);
        assert_eq!(cfg.smoothing, KalmanParams::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(CoreConfig::from_json_str(r#"{ "wiener": { "overlap": 3 } }"#).is_err());
        assert!(CoreConfig::from_json_str(r#"{ "wiener": { "history_size": 0 } }"#).is_err());
        assert!(CoreConfig::from_json_str(r#"{ "filter_bank": { "num_filters": 0 } }"#).is_err());
        assert!(CoreConfig::from_json_str("not json").is_err());
        assert!(CoreConfig::from_json_str(
            r#"{ "wiener": { "buffer_size": 16, "overlap": 4, "history_size": 1, "gain_exponent": -1.0 } }"#
        )
        .is_err());

        let mut cfg = CoreConfig::default();
        cfg.wiener.gain_exponent = 0.0;
        assert_eq!(cfg.validate(), Err(DspError::InvalidGainExponent(0.0)));

        let mut cfg = CoreConfig::default();
        cfg.wiener.buffer_size = 0;
        assert_eq!(cfg.validate(), Err(DspError::InvalidBufferSize(0)));
    }

    #[test]
    fn test_json_round_trip() {
        let mut cfg = CoreConfig::default();
        cfg.filter_bank.scale = Scale::Log;
        cfg.smoothing.process_noise = 0.2;
        let json = cfg.to_json_string().unwrap();
        assert_eq!(CoreConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn test_filter_bank_key_uses_bin_count() {
        let key = FilterBankConfig::default().key(1024, 44100.0);
        assert_eq!(key.data_size, 513);
        assert_eq!(key.num_filters, DEFAULT_NUM_FILTERS);
    }
}
