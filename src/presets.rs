use crate::config::CoreConfig;
use crate::dsp::kalman::KalmanParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// SMOOTHING PRESETS
// =============================================================================

/// Trade-offs between tracking speed and temporal smoothness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SmoothingPreset {
    #[default]
    Manual,
    Responsive,
    Balanced,
    Smooth,
}

impl SmoothingPreset {
    pub fn all_presets() -> [SmoothingPreset; 4] {
        [
            SmoothingPreset::Manual,
            SmoothingPreset::Responsive,
            SmoothingPreset::Balanced,
            SmoothingPreset::Smooth,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SmoothingPreset::Manual => "Manual",
            SmoothingPreset::Responsive => "Responsive",
            SmoothingPreset::Balanced => "Balanced",
            SmoothingPreset::Smooth => "Smooth",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SmoothingPreset::Manual => "Custom settings - no preset applied",
            SmoothingPreset::Responsive => "Short history and fast tracking for speech and transients",
            SmoothingPreset::Balanced => "General purpose smoothing",
            SmoothingPreset::Smooth => "Long history and slow tracking for sustained material",
        }
    }

    /// Built-in values, used when `presets.json` lacks an entry.
    pub fn get_values(&self) -> Option<PresetValues> {
        match self {
            SmoothingPreset::Manual => None,
            SmoothingPreset::Responsive => Some(PresetValues {
                smoothing: KalmanParams {
                    measurement_error: 0.03,
                    estimate_error: 0.03,
                    process_noise: 0.5,
                },
                history_size: 3,
                gain_exponent: 1.0,
            }),
            SmoothingPreset::Balanced => Some(PresetValues {
                smoothing: KalmanParams::default(),
                history_size: 5,
                gain_exponent: 1.0,
            }),
            SmoothingPreset::Smooth => Some(PresetValues {
                smoothing: KalmanParams {
                    measurement_error: 0.03,
                    estimate_error: 0.03,
                    process_noise: 0.005,
                },
                history_size: 9,
                gain_exponent: 2.0,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetValues {
    pub smoothing: KalmanParams,
    pub history_size: usize,
    pub gain_exponent: f32,
}

impl PresetValues {
    /// Writes the preset into `cfg`, leaving framing and filter bank alone.
    pub fn apply_to(&self, cfg: &mut CoreConfig) {
        cfg.smoothing = self.smoothing;
        cfg.wiener.history_size = self.history_size;
        cfg.wiener.gain_exponent = self.gain_exponent;
    }
}

#[derive(Debug)]
pub struct PresetManager {
    presets: HashMap<String, PresetValues>,
}

impl PresetManager {
    /// Loads the baked-in presets. A malformed file is not fatal: the
    /// built-in values are used instead.
    pub fn new() -> Self {
        Self::from_json_str(include_str!("../presets.json"))
    }

    pub fn from_json_str(json: &str) -> Self {
        match serde_json::from_str::<HashMap<String, PresetValues>>(json) {
            Ok(presets) => Self { presets },
            Err(e) => {
                log::warn!("preset JSON rejected ({e}), using built-in presets");
                Self::default()
            }
        }
    }

    pub fn get_preset_values(&self, preset: SmoothingPreset) -> Option<PresetValues> {
        self.presets
            .get(preset.name())
            .copied()
            .or_else(|| preset.get_values())
    }

    /// Applies `preset` to `cfg`. Returns false for `Manual` or unknown presets.
    pub fn apply(&self, preset: SmoothingPreset, cfg: &mut CoreConfig) -> bool {
        match self.get_preset_values(preset) {
            Some(values) => {
                values.apply_to(cfg);
                true
            }
            None => false,
        }
    }
}

impl Default for PresetManager {
    fn default() -> Self {
        let presets = SmoothingPreset::all_presets()
            .into_iter()
            .filter_map(|p| p.get_values().map(|v| (p.name().to_string(), v)))
            .collect();
        Self { presets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baked_in_presets_parse() {
        let json = include_str!("../presets.json");
        let parsed: HashMap<String, PresetValues> = serde_json::from_str(json).unwrap();
        for preset in SmoothingPreset::all_presets() {
            if preset != SmoothingPreset::Manual {
                assert!(parsed.contains_key(preset.name()), "missing {}", preset.name());
            }
        }
    }

    #[test]
    fn test_manual_has_no_values() {
        let mgr = PresetManager::new();
        let mut cfg = CoreConfig::default();
        assert!(!mgr.apply(SmoothingPreset::Manual, &mut cfg));
        assert_eq!(cfg, CoreConfig::default());
    }

    #[test]
    fn test_apply_changes_smoothing_only() {
        let mgr = PresetManager::new();
        let mut cfg = CoreConfig::default();
        assert!(mgr.apply(SmoothingPreset::Smooth, &mut cfg));
        assert!(cfg.wiener.history_size > CoreConfig::default().wiener.history_size);
        assert_eq!(cfg.wiener.buffer_size, CoreConfig::default().wiener.buffer_size);
        assert_eq!(cfg.filter_bank, CoreConfig::default().filter_bank);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_falls_back_to_builtins() {
        let mgr = PresetManager::from_json_str("{ not json");
        assert_eq!(
            mgr.get_preset_values(SmoothingPreset::Balanced),
            SmoothingPreset::Balanced.get_values()
        );
    }

    #[test]
    fn test_presets_order_by_responsiveness() {
        let mgr = PresetManager::new();
        let fast = mgr.get_preset_values(SmoothingPreset::Responsive).unwrap();
        let slow = mgr.get_preset_values(SmoothingPreset::Smooth).unwrap();
        assert!(fast.smoothing.process_noise > slow.smoothing.process_noise);
        assert!(fast.history_size < slow.history_size);
    }
}
