//! Early reflection generator
//!
//! Multi-tap delay line producing discrete early reflections. 16 taps per
//! channel with exponentially-distributed delay times (5-80 ms), inverse
//! distance gain rolloff and per-tap air absorption filtering. Left and
//! right channels use different tap patterns for stereo decorrelation.

use std::sync::atomic::{AtomicBool, Ordering};

use umbra_core::Sample;

use crate::delay_line::FractionalDelayLine;
use crate::math::{DENORMAL_BIAS, TWO_PI};

const NUM_TAPS: usize = 16;
const MIN_TIME_MS: f64 = 5.0;
const MAX_TIME_MS: f64 = 80.0;

#[derive(Debug, Clone, Copy, Default)]
struct Tap {
    delay_samples: usize,
    gain: Sample,
    lp_coeff: Sample,
    lp_state: Sample,
}

#[derive(Debug)]
pub struct EarlyReflections {
    buffer_l: FractionalDelayLine,
    buffer_r: FractionalDelayLine,
    taps_l: [Tap; NUM_TAPS],
    taps_r: [Tap; NUM_TAPS],
    er_size: f64,
    time_scale: f64,
    sample_rate: f64,
    /// Set by control-thread setters, consumed once per block so the tap
    /// tables only rebuild at block boundaries.
    taps_stale: AtomicBool,
}

impl EarlyReflections {
    pub fn new(sample_rate: f64) -> Self {
        let max_samples = (MAX_TIME_MS * 0.001 * sample_rate).ceil() as usize + 1;
        let mut er = Self {
            buffer_l: FractionalDelayLine::new(max_samples),
            buffer_r: FractionalDelayLine::new(max_samples),
            taps_l: [Tap::default(); NUM_TAPS],
            taps_r: [Tap::default(); NUM_TAPS],
            er_size: 1.0,
            time_scale: 1.0,
            sample_rate,
            taps_stale: AtomicBool::new(false),
        };
        er.update_taps();
        er
    }

    /// Call once at the top of each block; rebuilds the tap tables if a
    /// setter has been called since the last block.
    pub fn begin_block(&mut self) {
        if self.taps_stale.swap(false, Ordering::Acquire) {
            self.update_taps();
        }
    }

    #[inline(always)]
    pub fn process_sample(&mut self, input_l: Sample, input_r: Sample) -> (Sample, Sample) {
        self.buffer_l.write(input_l);
        self.buffer_r.write(input_r);

        let mut out_l = 0.0;
        let mut out_r = 0.0;

        for t in 0..NUM_TAPS {
            let tap = &mut self.taps_l[t];
            let x = self.buffer_l.read(tap.delay_samples) * tap.gain;
            tap.lp_state =
                (1.0 - tap.lp_coeff) * x + tap.lp_coeff * tap.lp_state + DENORMAL_BIAS;
            out_l += tap.lp_state;

            let tap = &mut self.taps_r[t];
            let x = self.buffer_r.read(tap.delay_samples) * tap.gain;
            tap.lp_state =
                (1.0 - tap.lp_coeff) * x + tap.lp_coeff * tap.lp_state + DENORMAL_BIAS;
            out_r += tap.lp_state;
        }

        (out_l, out_r)
    }

    pub fn set_size(&mut self, size: f64) {
        self.er_size = size.clamp(0.0, 1.0);
        self.taps_stale.store(true, Ordering::Release);
    }

    /// Clamped to [0.1, 1.0]; the buffer is sized for the full 80 ms span
    /// at scale 1.0.
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.clamp(0.1, 1.0);
        self.taps_stale.store(true, Ordering::Release);
    }

    pub fn clear(&mut self) {
        self.buffer_l.clear();
        self.buffer_r.clear();
        for tap in self.taps_l.iter_mut().chain(self.taps_r.iter_mut()) {
            tap.lp_state = 0.0;
        }
    }

    fn update_taps(&mut self) {
        // 0.3 (small room) to 1.0 (large hall)
        let size_scale = (0.3 + 0.7 * self.er_size) * self.time_scale;
        let sr = self.sample_rate;
        let time_ratio = MAX_TIME_MS / MIN_TIME_MS;

        for i in 0..NUM_TAPS {
            let t_l = i as f64 / (NUM_TAPS - 1) as f64;
            let time_ms_l = MIN_TIME_MS * time_ratio.powf(t_l) * size_scale;

            // Right channel tap index shifted by 0.37 for a decorrelated
            // delay pattern
            let t_r = (i as f64 + 0.37) / ((NUM_TAPS - 1) as f64 + 0.37);
            let time_ms_r = MIN_TIME_MS * time_ratio.powf(t_r) * size_scale;

            self.taps_l[i].delay_samples = ((time_ms_l * 0.001 * sr) as usize).max(1);
            self.taps_r[i].delay_samples = ((time_ms_r * 0.001 * sr) as usize).max(1);

            // Inverse distance law: gain proportional to 1/time
            self.taps_l[i].gain = 1.0 / (time_ms_l / MIN_TIME_MS);
            self.taps_r[i].gain = 1.0 / (time_ms_r / MIN_TIME_MS);

            // Air absorption cutoff sweeps 12 kHz (earliest) to 2 kHz (latest)
            let cutoff_l = 12000.0 * (2000.0f64 / 12000.0).powf(t_l);
            let cutoff_r = 12000.0 * (2000.0f64 / 12000.0).powf(t_r);
            self.taps_l[i].lp_coeff = (-TWO_PI * cutoff_l / sr).exp();
            self.taps_r[i].lp_coeff = (-TWO_PI * cutoff_r / sr).exp();

            self.taps_l[i].lp_state = 0.0;
            self.taps_r[i].lp_state = 0.0;
        }

        // Normalize tap gains to sum to 1.0 per channel; raw inverse
        // distance gains across 16 taps would sum to ~5.7x.
        let sum_l: Sample = self.taps_l.iter().map(|t| t.gain).sum();
        let sum_r: Sample = self.taps_r.iter().map(|t| t.gain).sum();
        if sum_l > 0.0 {
            for tap in &mut self.taps_l {
                tap.gain /= sum_l;
            }
        }
        if sum_r > 0.0 {
            for tap in &mut self.taps_r {
                tap.gain /= sum_r;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tap_gains_normalized() {
        let er = EarlyReflections::new(48000.0);
        let sum_l: Sample = er.taps_l.iter().map(|t| t.gain).sum();
        let sum_r: Sample = er.taps_r.iter().map(|t| t.gain).sum();
        assert_abs_diff_eq!(sum_l, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sum_r, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tap_delays_increase_and_fit_buffer() {
        let er = EarlyReflections::new(48000.0);
        for taps in [&er.taps_l, &er.taps_r] {
            for w in taps.windows(2) {
                assert!(w[0].delay_samples < w[1].delay_samples);
            }
            assert!(taps[NUM_TAPS - 1].delay_samples < er.buffer_l.capacity());
        }
    }

    #[test]
    fn test_stereo_patterns_differ() {
        let er = EarlyReflections::new(48000.0);
        let distinct = er
            .taps_l
            .iter()
            .zip(er.taps_r.iter())
            .filter(|(l, r)| l.delay_samples != r.delay_samples)
            .count();
        assert!(distinct > NUM_TAPS / 2);
    }

    #[test]
    fn test_impulse_produces_multiple_reflections() {
        let mut er = EarlyReflections::new(48000.0);
        er.begin_block();

        let mut nonzero = 0;
        for i in 0..4800 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (l, _) = er.process_sample(x, x);
            if l.abs() > 1e-6 {
                nonzero += 1;
            }
        }
        // Each tap is lowpass-smeared, so expect well over 16 nonzero samples
        assert!(nonzero > 16);
    }

    #[test]
    fn test_setter_defers_rebuild_to_block_start() {
        let mut er = EarlyReflections::new(48000.0);
        let before = er.taps_l[NUM_TAPS - 1].delay_samples;

        er.set_size(0.0);
        assert_eq!(er.taps_l[NUM_TAPS - 1].delay_samples, before);

        er.begin_block();
        assert!(er.taps_l[NUM_TAPS - 1].delay_samples < before);
    }

    #[test]
    fn test_smaller_size_shortens_taps() {
        let mut big = EarlyReflections::new(48000.0);
        big.set_size(1.0);
        big.begin_block();

        let mut small = EarlyReflections::new(48000.0);
        small.set_size(0.0);
        small.begin_block();

        assert!(
            small.taps_l[NUM_TAPS - 1].delay_samples < big.taps_l[NUM_TAPS - 1].delay_samples
        );
    }
}
