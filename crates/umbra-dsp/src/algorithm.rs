//! Per-algorithm tuning tables
//!
//! Each reverb algorithm is a single static table of delay lengths, output
//! tap assignments, diffusion coefficients and scale factors. The engine
//! core never branches on the algorithm; it just gets retuned from the
//! selected table when the algorithm changes.

use umbra_core::Algorithm;

/// Number of FDN delay lines.
pub const NUM_DELAY_LINES: usize = 16;

/// Output taps drawn from the FDN per stereo channel.
pub const TAPS_PER_CHANNEL: usize = 8;

/// Largest base delay length across all algorithm tables, in samples at
/// the 44.1 kHz reference rate. Sizing buffers from this constant lets a
/// running engine switch algorithms without reallocation.
pub const MAX_BASE_DELAY: usize = 3251;

#[derive(Debug, Clone, Copy)]
pub struct AlgorithmConfig {
    pub name: &'static str,

    /// FDN base delay lengths in samples at 44.1 kHz. Mutually coprime so
    /// no two lines share resonant modes.
    pub delay_lengths: [usize; NUM_DELAY_LINES],

    /// Which FDN lines feed each output channel, and with what polarity.
    pub left_taps: [usize; TAPS_PER_CHANNEL],
    pub right_taps: [usize; TAPS_PER_CHANNEL],
    pub left_signs: [f64; TAPS_PER_CHANNEL],
    pub right_signs: [f64; TAPS_PER_CHANNEL],

    /// Maximum allpass coefficient for input diffusion stages 1-2 and 3-4.
    pub input_diff_max_coeff_12: f64,
    pub input_diff_max_coeff_34: f64,
    pub output_diff_scale: f64,

    /// Input bandwidth lowpass cutoff in Hz.
    pub bandwidth_hz: f64,

    pub er_level_scale: f64,
    pub er_time_scale: f64,

    pub late_gain_scale: f64,

    pub mod_depth_scale: f64,
    pub mod_rate_scale: f64,

    pub treble_mult_scale: f64,
    pub bass_mult_scale: f64,

    pub size_range_min: f64,
    pub size_range_max: f64,
}

/// Plate: tight delay clustering (15-40 ms), maximum diffusion, no early
/// reflections, bright.
static PLATE: AlgorithmConfig = AlgorithmConfig {
    name: "Plate",
    delay_lengths: [
        661, 709, 743, 787, 811, 853, 883, 919, 947, 983, 1021, 1063, 1097, 1151, 1201, 1249,
    ],
    left_taps: [0, 2, 5, 7, 9, 11, 13, 15],
    right_taps: [1, 3, 4, 6, 8, 10, 12, 14],
    left_signs: [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
    right_signs: [-1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0],
    input_diff_max_coeff_12: 0.75,
    input_diff_max_coeff_34: 0.75,
    output_diff_scale: 1.0,
    bandwidth_hz: 14000.0,
    er_level_scale: 0.0,
    er_time_scale: 1.0,
    late_gain_scale: 1.0,
    mod_depth_scale: 0.3,
    mod_rate_scale: 1.0,
    treble_mult_scale: 1.0,
    bass_mult_scale: 1.0,
    size_range_min: 0.5,
    size_range_max: 1.5,
};

/// Hall: the reference tuning; all scale factors are 1.0.
static HALL: AlgorithmConfig = AlgorithmConfig {
    name: "Hall",
    delay_lengths: [
        887, 953, 1039, 1151, 1277, 1399, 1549, 1699, 1873, 2063, 2281, 2503, 2719, 2927, 3089,
        3251,
    ],
    left_taps: [0, 3, 5, 8, 10, 11, 14, 15],
    right_taps: [1, 2, 4, 6, 7, 9, 12, 13],
    left_signs: [1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0],
    right_signs: [-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0],
    input_diff_max_coeff_12: 0.75,
    input_diff_max_coeff_34: 0.625,
    output_diff_scale: 1.0,
    bandwidth_hz: 10000.0,
    er_level_scale: 1.0,
    er_time_scale: 1.0,
    late_gain_scale: 1.0,
    mod_depth_scale: 1.0,
    mod_rate_scale: 1.0,
    treble_mult_scale: 1.0,
    bass_mult_scale: 1.0,
    size_range_min: 0.5,
    size_range_max: 1.5,
};

/// Chamber: medium delay spread, slightly brighter than hall, moderate
/// early reflections.
static CHAMBER: AlgorithmConfig = AlgorithmConfig {
    name: "Chamber",
    delay_lengths: [
        751, 809, 863, 929, 997, 1061, 1129, 1193, 1259, 1327, 1399, 1471, 1543, 1613, 1693, 1777,
    ],
    left_taps: [0, 2, 5, 7, 9, 11, 13, 15],
    right_taps: [1, 3, 4, 6, 8, 10, 12, 14],
    left_signs: [1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0],
    right_signs: [-1.0, 1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0],
    input_diff_max_coeff_12: 0.75,
    input_diff_max_coeff_34: 0.625,
    output_diff_scale: 1.0,
    bandwidth_hz: 10000.0,
    er_level_scale: 0.8,
    er_time_scale: 0.85,
    late_gain_scale: 1.0,
    mod_depth_scale: 0.6,
    mod_rate_scale: 1.0,
    treble_mult_scale: 1.15,
    bass_mult_scale: 1.0,
    size_range_min: 0.5,
    size_range_max: 1.5,
};

/// Room: geometrically-spaced delays (7-25 ms), ER-dominant, moderate
/// modulation. The wide 3.56:1 delay ratio avoids flutter echo; modulation
/// breaks up metallic ringing.
static ROOM: AlgorithmConfig = AlgorithmConfig {
    name: "Room",
    delay_lengths: [
        307, 331, 359, 389, 431, 461, 503, 547, 599, 653, 719, 773, 857, 937, 1009, 1093,
    ],
    left_taps: [0, 3, 5, 6, 9, 10, 12, 15],
    right_taps: [1, 2, 4, 7, 8, 11, 13, 14],
    left_signs: [1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0],
    right_signs: [-1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0],
    input_diff_max_coeff_12: 0.65,
    input_diff_max_coeff_34: 0.55,
    output_diff_scale: 1.0,
    bandwidth_hz: 12000.0,
    er_level_scale: 1.5,
    er_time_scale: 0.6,
    late_gain_scale: 0.7,
    mod_depth_scale: 0.5,
    mod_rate_scale: 1.1,
    treble_mult_scale: 0.85,
    bass_mult_scale: 0.9,
    size_range_min: 0.5,
    size_range_max: 1.5,
};

/// Ambient: widest delay spread, max diffusion, heavy modulation, no early
/// reflections.
static AMBIENT: AlgorithmConfig = AlgorithmConfig {
    name: "Ambient",
    delay_lengths: [
        971, 1049, 1153, 1277, 1399, 1523, 1667, 1811, 1949, 2111, 2269, 2437, 2609, 2789, 2969,
        3169,
    ],
    left_taps: [0, 2, 5, 7, 8, 11, 13, 15],
    right_taps: [1, 3, 4, 6, 9, 10, 12, 14],
    left_signs: [1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0],
    right_signs: [-1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0],
    input_diff_max_coeff_12: 0.80,
    input_diff_max_coeff_34: 0.80,
    output_diff_scale: 1.0,
    bandwidth_hz: 8000.0,
    er_level_scale: 0.0,
    er_time_scale: 1.0,
    late_gain_scale: 1.0,
    mod_depth_scale: 1.5,
    mod_rate_scale: 1.3,
    treble_mult_scale: 1.1,
    bass_mult_scale: 1.2,
    size_range_min: 0.5,
    size_range_max: 1.5,
};

/// Tuning table for the given algorithm.
pub fn config(algorithm: Algorithm) -> &'static AlgorithmConfig {
    match algorithm {
        Algorithm::Plate => &PLATE,
        Algorithm::Hall => &HALL,
        Algorithm::Chamber => &CHAMBER,
        Algorithm::Room => &ROOM,
        Algorithm::Ambient => &AMBIENT,
    }
}
