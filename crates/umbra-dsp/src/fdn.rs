//! 16-line feedback delay network
//!
//! The late reverberation core. Sixteen modulated delay lines feed back
//! through a Hadamard mixing matrix with two-band decay damping in each
//! loop. Stereo output is drawn from eight signed taps per channel.

use umbra_core::{Algorithm, Sample};

use crate::algorithm::{self, AlgorithmConfig, MAX_BASE_DELAY, NUM_DELAY_LINES, TAPS_PER_CHANNEL};
use crate::damping::TwoBandDamping;
use crate::delay_line::FractionalDelayLine;
use crate::math::{DENORMAL_BIAS, TWO_PI, fast_tanh};

const N: usize = NUM_DELAY_LINES;
const BASE_SAMPLE_RATE: f64 = 44100.0;

/// Normalizes the 8-tap output sum: 1/sqrt(8).
const OUTPUT_SCALE: Sample = 0.353553;
/// +6 dB compensation after the soft clipper.
const OUTPUT_GAIN: Sample = 2.0;

/// Irregularly-spaced per-line LFO rate factors. Adjacent ratios avoid
/// simple rational relationships so no two lines ever re-align into
/// audible beating patterns.
const RATE_FACTORS: [f64; N] = [
    0.801, 0.857, 0.919, 0.953, 0.991, 1.031, 1.063, 1.097, 1.127, 1.163, 1.193, 1.223, 1.259,
    1.289, 1.319, 1.361,
];

/// In-place fast Walsh-Hadamard transform for N=16, O(N log N).
/// Normalization (1/sqrt(16) = 0.25) is folded into the final butterfly
/// stage to save a separate scaling pass.
#[inline(always)]
pub fn hadamard16(data: &mut [Sample; 16]) {
    const LOG2_N: usize = 4;

    for stage in 0..(LOG2_N - 1) {
        let len = 1 << stage;
        let mut i = 0;
        while i < 16 {
            for j in 0..len {
                let a = data[i + j];
                let b = data[i + j + len];
                data[i + j] = a + b;
                data[i + j + len] = a - b;
            }
            i += 2 * len;
        }
    }

    const NORM: Sample = 0.25;
    for j in 0..8 {
        let a = data[j];
        let b = data[j + 8];
        data[j] = (a + b) * NORM;
        data[j + 8] = (a - b) * NORM;
    }
}

#[derive(Debug)]
pub struct FdnCore {
    delay_lines: Vec<FractionalDelayLine>,
    damp_filters: [TwoBandDamping; N],

    base_delays: [usize; N],
    left_taps: [usize; TAPS_PER_CHANNEL],
    right_taps: [usize; TAPS_PER_CHANNEL],
    left_signs: [Sample; TAPS_PER_CHANNEL],
    right_signs: [Sample; TAPS_PER_CHANNEL],

    lfo_phase: [f64; N],
    lfo_phase_inc: [f64; N],
    delay_length: [f64; N],

    sample_rate: f64,
    decay_time: f64,
    bass_multiply: f64,
    treble_multiply: f64,
    crossover_freq: f64,
    mod_depth_samples: f64,
    mod_rate_hz: f64,
    size_param: f64,
    size_range_min: f64,
    size_range_max: f64,
    frozen: bool,
}

impl FdnCore {
    pub fn new(sample_rate: f64) -> Self {
        let hall = algorithm::config(Algorithm::Hall);

        // Size buffers for the worst case across all algorithm tables so an
        // algorithm switch never reallocates. +12 covers max modulation
        // depth (8 samples), cubic interpolation (2) and safety margin (2).
        let max_size_scale: f64 = 1.5;
        let max_delay =
            MAX_BASE_DELAY as f64 * (sample_rate / BASE_SAMPLE_RATE) * max_size_scale;
        let capacity = max_delay.ceil() as usize + 12;

        let mut fdn = Self {
            delay_lines: (0..N).map(|_| FractionalDelayLine::new(capacity)).collect(),
            damp_filters: Default::default(),
            base_delays: hall.delay_lengths,
            left_taps: hall.left_taps,
            right_taps: hall.right_taps,
            left_signs: hall.left_signs,
            right_signs: hall.right_signs,
            lfo_phase: std::array::from_fn(|i| TWO_PI * i as f64 / N as f64),
            lfo_phase_inc: [0.0; N],
            delay_length: [0.0; N],
            sample_rate,
            decay_time: 1.0,
            bass_multiply: 1.0,
            treble_multiply: 0.5,
            crossover_freq: 1000.0,
            mod_depth_samples: 2.0,
            mod_rate_hz: 1.0,
            size_param: 1.0,
            size_range_min: 0.5,
            size_range_max: 1.5,
            frozen: false,
        };

        fdn.update_delay_lengths();
        fdn.update_lfo_rates();
        fdn.update_decay_coefficients();
        fdn
    }

    /// Process one stereo input sample; returns the late-field stereo pair.
    #[inline(always)]
    pub fn process_sample(&mut self, input_l: Sample, input_r: Sample) -> (Sample, Sample) {
        let mono_in = (input_l + input_r) * 0.5;

        // Read all lines at their LFO-modulated fractional positions
        let mut delay_out = [0.0; N];
        for ch in 0..N {
            let modulation = self.lfo_phase[ch].sin() * self.mod_depth_samples;
            delay_out[ch] = self.delay_lines[ch].read_cubic(self.delay_length[ch] + modulation);

            self.lfo_phase[ch] += self.lfo_phase_inc[ch];
            if self.lfo_phase[ch] >= TWO_PI {
                self.lfo_phase[ch] -= TWO_PI;
            }
        }

        // Hadamard feedback mixing
        let mut feedback = delay_out;
        hadamard16(&mut feedback);

        // Damping plus input injection, write back into the lines
        for ch in 0..N {
            // Frozen: bypass damping (unity feedback) and mute new input so
            // the existing tail sustains indefinitely
            let filtered = if self.frozen {
                feedback[ch]
            } else {
                self.damp_filters[ch].process(feedback[ch])
            };
            let input_gain = if self.frozen { 0.0 } else { 0.25 };
            let polarity = if ch & 1 == 1 { -1.0 } else { 1.0 };
            let bias = if (self.delay_lines[ch].cursor() ^ ch) & 1 == 1 {
                DENORMAL_BIAS
            } else {
                -DENORMAL_BIAS
            };

            self.delay_lines[ch].write(filtered + mono_in * polarity * input_gain + bias);
        }

        // Decorrelated stereo from signed tap sums of the pre-mix outputs
        let mut out_l = 0.0;
        let mut out_r = 0.0;
        for t in 0..TAPS_PER_CHANNEL {
            out_l += delay_out[self.left_taps[t]] * self.left_signs[t];
            out_r += delay_out[self.right_taps[t]] * self.right_signs[t];
        }

        // Soft-clip the normalized sum (prevents runaway at long decays),
        // then compensate the conservative 1/sqrt(8) normalization
        (
            fast_tanh(out_l * OUTPUT_SCALE) * OUTPUT_GAIN,
            fast_tanh(out_r * OUTPUT_SCALE) * OUTPUT_GAIN,
        )
    }

    pub fn set_decay_time(&mut self, seconds: f64) {
        self.decay_time = seconds.clamp(0.2, 30.0);
        self.update_decay_coefficients();
    }

    pub fn set_bass_multiply(&mut self, mult: f64) {
        self.bass_multiply = mult.clamp(0.5, 2.5);
        self.update_decay_coefficients();
    }

    pub fn set_treble_multiply(&mut self, mult: f64) {
        self.treble_multiply = mult.clamp(0.1, 1.5);
        self.update_decay_coefficients();
    }

    pub fn set_crossover_freq(&mut self, hz: f64) {
        self.crossover_freq = hz.clamp(200.0, 4000.0);
        self.update_decay_coefficients();
    }

    pub fn set_mod_depth(&mut self, depth: f64) {
        self.mod_depth_samples = depth.clamp(0.0, 2.0) * 4.0;
    }

    pub fn set_mod_rate(&mut self, hz: f64) {
        self.mod_rate_hz = hz.max(0.01);
        self.update_lfo_rates();
    }

    pub fn set_size(&mut self, size: f64) {
        self.size_param = size.clamp(0.0, 1.0);
        self.update_delay_lengths();
        self.update_decay_coefficients();
    }

    pub fn set_freeze(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Retune the network from an algorithm table: base delays, output taps
    /// and the size range.
    pub fn apply_config(&mut self, config: &AlgorithmConfig) {
        for (dst, &src) in self.base_delays.iter_mut().zip(config.delay_lengths.iter()) {
            *dst = src.clamp(1, MAX_BASE_DELAY);
        }
        for t in 0..TAPS_PER_CHANNEL {
            self.left_taps[t] = config.left_taps[t].min(N - 1);
            self.right_taps[t] = config.right_taps[t].min(N - 1);
        }
        self.left_signs = config.left_signs;
        self.right_signs = config.right_signs;

        self.size_range_min = config.size_range_min.clamp(0.0, 1.5);
        self.size_range_max = config.size_range_max.clamp(self.size_range_min, 1.5);

        self.update_delay_lengths();
        self.update_decay_coefficients();
    }

    pub fn clear(&mut self) {
        for dl in &mut self.delay_lines {
            dl.clear();
        }
        for damp in &mut self.damp_filters {
            damp.reset();
        }
        for (i, phase) in self.lfo_phase.iter_mut().enumerate() {
            *phase = TWO_PI * i as f64 / N as f64;
        }
    }

    fn update_delay_lengths(&mut self) {
        let size_scale =
            self.size_range_min + (self.size_range_max - self.size_range_min) * self.size_param;
        let rate_ratio = self.sample_rate / BASE_SAMPLE_RATE;

        for i in 0..N {
            self.delay_length[i] = self.base_delays[i] as f64 * rate_ratio * size_scale;
        }
    }

    fn update_decay_coefficients(&mut self) {
        let crossover_coeff = (-TWO_PI * self.crossover_freq / self.sample_rate).exp();

        for i in 0..N {
            // Per-line feedback gain for the target RT60:
            // g = 10^(-3*L / (RT60*sr)) puts the loop at -60 dB after RT60
            let g_base =
                10.0f64.powf(-3.0 * self.delay_length[i] / (self.decay_time * self.sample_rate));

            // bass_multiply > 1 lets lows sustain longer (g_low > g_base);
            // treble_multiply < 1 makes highs decay faster (g_high < g_base)
            let g_low = g_base.powf(1.0 / self.bass_multiply);
            let g_high = g_base.powf(1.0 / self.treble_multiply);

            self.damp_filters[i].set_coefficients(g_low, g_high, crossover_coeff);
        }
    }

    fn update_lfo_rates(&mut self) {
        for i in 0..N {
            self.lfo_phase_inc[i] = TWO_PI * self.mod_rate_hz * RATE_FACTORS[i] / self.sample_rate;
        }
    }
}
