use std::f32::consts::PI;

/// Floor applied before taking logarithms of magnitudes.
pub const MAG_FLOOR: f32 = 1e-10;

/// Lowest level reported by [`gain_to_db`].
pub const DB_FLOOR: f32 = -200.0;

/// Guard for power ratios.
pub const POWER_EPS: f32 = 1e-20;

pub fn db_to_gain(db: f32) -> f32 {
    (10.0f32).powf(db / 20.0)
}

pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= MAG_FLOOR {
        return DB_FLOOR;
    }
    (20.0 * gain.log10()).max(DB_FLOOR)
}

/// Periodic Hann window, as used by the analysis side of an STFT.
pub fn make_hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / len as f32).cos())
        .collect()
}

/// Hann-shaped weights that never touch zero at either end.
///
/// Sampled at the interior points `1..=len` of a Hann window of length
/// `len + 1`, so every slot carries weight and the peak sits in the middle.
pub fn make_open_hann_weights(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * (i + 1) as f32 / (len + 1) as f32).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_gain_round_trip() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((gain_to_db(db_to_gain(-12.0)) + 12.0).abs() < 1e-4);
        assert_eq!(gain_to_db(0.0), DB_FLOOR);
    }

    #[test]
    fn test_open_hann_weights_are_positive_and_centered() {
        let w = make_open_hann_weights(5);
        assert!(w.iter().all(|&v| v > 0.0));
        assert!((w[2] - 1.0).abs() < 1e-6);
        assert!((w[0] - w[4]).abs() < 1e-6);
        let single = make_open_hann_weights(1);
        assert_eq!(single.len(), 1);
        assert!((single[0] - 1.0).abs() < 1e-6);
    }
}
