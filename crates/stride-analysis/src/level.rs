//! Signal level and silence gating.

/// Level reported for digital silence.
pub const SILENCE_FLOOR_DB: f32 = -200.0;

/// Mean-energy level of `samples` in dB (`10 * log10(mean(x^2))`).
///
/// Empty or all-zero input reports [`SILENCE_FLOOR_DB`].
pub fn level_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return SILENCE_FLOOR_DB;
    }
    let energy: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>()
        / samples.len() as f64;
    if energy <= 0.0 {
        SILENCE_FLOOR_DB
    } else {
        ((10.0 * energy.log10()) as f32).max(SILENCE_FLOOR_DB)
    }
}

/// Whether the level of `samples` falls below `threshold_db`.
#[inline]
pub fn is_silent(samples: &[f32], threshold_db: f32) -> bool {
    level_db(samples) < threshold_db
}

/// Map a level in dB to a MIDI velocity: `127 + floor(level_db)`, clamped to 1..=127.
pub fn level_to_velocity(level_db: f32) -> u8 {
    (127.0 + level_db.floor()).clamp(1.0, 127.0) as u8
}
