//! Host-facing parameter model
//!
//! The host-integration layer owns automation smoothing and persistence;
//! it hands the engine a clamped snapshot of these values at block rate.

use serde::{Deserialize, Serialize};

/// Reverb algorithm selection (one of five fixed room characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Algorithm {
    Plate,
    #[default]
    Hall,
    Chamber,
    Room,
    Ambient,
}

impl Algorithm {
    pub const COUNT: usize = 5;

    /// Map a host-provided index (0-4) to an algorithm. Out-of-range
    /// indices fall back to Hall.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Plate,
            1 => Self::Hall,
            2 => Self::Chamber,
            3 => Self::Room,
            4 => Self::Ambient,
            _ => Self::Hall,
        }
    }

    pub fn as_index(self) -> usize {
        match self {
            Self::Plate => 0,
            Self::Hall => 1,
            Self::Chamber => 2,
            Self::Room => 3,
            Self::Ambient => 4,
        }
    }
}

/// Complete parameter snapshot for the reverb engine.
///
/// Ranges are documented per field; [`ReverbParams::clamped`] normalizes a
/// snapshot to those ranges before it reaches the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbParams {
    pub algorithm: Algorithm,
    /// RT60 decay time in seconds, 0.2-30.0
    pub decay_time_s: f64,
    /// Pre-delay in milliseconds, 0-250
    pub pre_delay_ms: f64,
    /// Room size, 0.0-1.0 (mapped through the algorithm's size range)
    pub size: f64,
    /// Input diffusion amount, 0.0-1.0
    pub diffusion: f64,
    /// Output diffusion amount, 0.0-1.0
    pub output_diffusion: f64,
    /// Low-frequency decay multiplier, 0.5-2.5
    pub bass_multiply: f64,
    /// High-frequency decay multiplier, 0.1-1.5
    pub treble_multiply: f64,
    /// Damping crossover frequency in Hz, 200-4000
    pub crossover_hz: f64,
    /// Delay modulation depth, 0.0-2.0
    pub mod_depth: f64,
    /// Delay modulation rate in Hz, >= 0.01
    pub mod_rate_hz: f64,
    /// Early reflections level, 0.0-1.0
    pub er_level: f64,
    /// Early reflections size, 0.0-1.0
    pub er_size: f64,
    /// Dry/wet mix, 0.0 (dry) - 1.0 (wet)
    pub mix: f64,
    /// Output highpass ("lo cut") frequency in Hz, 20-500
    pub lo_cut_hz: f64,
    /// Output lowpass ("hi cut") frequency in Hz, 1000-20000
    pub hi_cut_hz: f64,
    /// Stereo width, 0.0 (mono) - 2.0 (extra wide)
    pub width: f64,
    /// Freeze: sustain the current tail indefinitely
    pub freeze: bool,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Hall,
            decay_time_s: 2.5,
            pre_delay_ms: 0.0,
            size: 1.0,
            diffusion: 0.75,
            output_diffusion: 0.5,
            bass_multiply: 1.2,
            treble_multiply: 0.5,
            crossover_hz: 1000.0,
            mod_depth: 0.4,
            mod_rate_hz: 0.8,
            er_level: 0.5,
            er_size: 1.0,
            mix: 0.3,
            lo_cut_hz: 20.0,
            hi_cut_hz: 20000.0,
            width: 1.0,
            freeze: false,
        }
    }
}

impl ReverbParams {
    /// Return a copy with every field clamped to its documented range.
    pub fn clamped(&self) -> Self {
        Self {
            algorithm: self.algorithm,
            decay_time_s: self.decay_time_s.clamp(0.2, 30.0),
            pre_delay_ms: self.pre_delay_ms.clamp(0.0, 250.0),
            size: self.size.clamp(0.0, 1.0),
            diffusion: self.diffusion.clamp(0.0, 1.0),
            output_diffusion: self.output_diffusion.clamp(0.0, 1.0),
            bass_multiply: self.bass_multiply.clamp(0.5, 2.5),
            treble_multiply: self.treble_multiply.clamp(0.1, 1.5),
            crossover_hz: self.crossover_hz.clamp(200.0, 4000.0),
            mod_depth: self.mod_depth.clamp(0.0, 2.0),
            mod_rate_hz: self.mod_rate_hz.max(0.01),
            er_level: self.er_level.clamp(0.0, 1.0),
            er_size: self.er_size.clamp(0.0, 1.0),
            mix: self.mix.clamp(0.0, 1.0),
            lo_cut_hz: self.lo_cut_hz.clamp(20.0, 500.0),
            hi_cut_hz: self.hi_cut_hz.clamp(1000.0, 20000.0),
            width: self.width.clamp(0.0, 2.0),
            freeze: self.freeze,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_index_roundtrip() {
        for i in 0..Algorithm::COUNT {
            assert_eq!(Algorithm::from_index(i).as_index(), i);
        }
        assert_eq!(Algorithm::from_index(99), Algorithm::Hall);
    }

    #[test]
    fn test_clamped_ranges() {
        let wild = ReverbParams {
            decay_time_s: 500.0,
            pre_delay_ms: -10.0,
            bass_multiply: 0.0,
            treble_multiply: 9.0,
            mod_rate_hz: 0.0,
            width: 7.0,
            ..Default::default()
        };
        let c = wild.clamped();
        assert_eq!(c.decay_time_s, 30.0);
        assert_eq!(c.pre_delay_ms, 0.0);
        assert_eq!(c.bass_multiply, 0.5);
        assert_eq!(c.treble_multiply, 1.5);
        assert_eq!(c.mod_rate_hz, 0.01);
        assert_eq!(c.width, 2.0);
    }

    #[test]
    fn test_params_serde_roundtrip() {
        let params = ReverbParams {
            algorithm: Algorithm::Ambient,
            decay_time_s: 8.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: ReverbParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
