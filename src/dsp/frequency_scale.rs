//! Linear-frequency <-> perceptual-scale conversions.
//!
//! The filter bank only needs a monotonic forward/inverse pair; [`Scale`]
//! provides the warpings the plugins use.

use serde::{Deserialize, Serialize};

// Mel (O'Shaughnessy / HTK form).
const MEL_FACTOR: f32 = 2595.0;
const MEL_BREAK_HZ: f32 = 700.0;

// Bark (Traunmüller 1990).
const BARK_SCALE: f32 = 26.81;
const BARK_BREAK_HZ: f32 = 1960.0;
const BARK_OFFSET: f32 = 0.53;

// Log scale knee: roughly linear below, logarithmic above.
const LOG_KNEE_HZ: f32 = 20.0;

pub trait FrequencyScale {
    fn hz_to_target(&self, hz: f32) -> f32;
    fn target_to_hz(&self, target: f32) -> f32;

    /// Target-scale values of 0 Hz and Nyquist.
    fn target_range(&self, sample_rate: f32) -> (f32, f32) {
        (self.hz_to_target(0.0), self.hz_to_target(sample_rate * 0.5))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scale {
    Linear,
    #[default]
    Mel,
    Bark,
    Log,
}

impl Scale {
    pub fn name(&self) -> &'static str {
        match self {
            Scale::Linear => "Linear",
            Scale::Mel => "Mel",
            Scale::Bark => "Bark",
            Scale::Log => "Log",
        }
    }
}

impl FrequencyScale for Scale {
    fn hz_to_target(&self, hz: f32) -> f32 {
        match self {
            Scale::Linear => hz,
            Scale::Mel => MEL_FACTOR * (1.0 + hz / MEL_BREAK_HZ).log10(),
            Scale::Bark => BARK_SCALE * hz / (BARK_BREAK_HZ + hz) - BARK_OFFSET,
            Scale::Log => (1.0 + hz / LOG_KNEE_HZ).log10(),
        }
    }

    fn target_to_hz(&self, target: f32) -> f32 {
        match self {
            Scale::Linear => target,
            Scale::Mel => MEL_BREAK_HZ * (10.0f32.powf(target / MEL_FACTOR) - 1.0),
            Scale::Bark => {
                BARK_BREAK_HZ * (target + BARK_OFFSET) / (BARK_SCALE - BARK_OFFSET - target)
            }
            Scale::Log => LOG_KNEE_HZ * (10.0f32.powf(target) - 1.0),
        }
    }
}
