//! Input and output diffusion
//!
//! Cascades of LFO-modulated Schroeder allpass filters. The input diffuser
//! (4 stages per channel) smears transients into a dense wash before the
//! feedback network; the output diffuser (2 stages per channel, lower
//! coefficient) adds density to the tail without blurring the stereo image.

use umbra_core::Sample;

use crate::delay_line::FractionalDelayLine;
use crate::math::{DENORMAL_BIAS, TWO_PI};

/// Single modulated allpass with Schroeder topology:
/// `H(z) = (z^-D - g) / (1 - g*z^-D)`.
#[derive(Debug, Clone)]
pub struct ModulatedAllpass {
    delay: FractionalDelayLine,
    delay_samples: f64,
    lfo_phase: f64,
    lfo_phase_inc: f64,
    lfo_depth: f64,
}

impl ModulatedAllpass {
    pub fn new(
        min_capacity: usize,
        delay_samples: f64,
        lfo_rate_hz: f64,
        lfo_depth_samples: f64,
        lfo_start_phase: f64,
        sample_rate: f64,
    ) -> Self {
        Self {
            delay: FractionalDelayLine::new(min_capacity),
            delay_samples,
            lfo_phase: lfo_start_phase,
            lfo_phase_inc: TWO_PI * lfo_rate_hz / sample_rate,
            lfo_depth: lfo_depth_samples,
        }
    }

    #[inline(always)]
    pub fn process(&mut self, input: Sample, g: Sample) -> Sample {
        let read_delay = self.delay_samples + self.lfo_phase.sin() * self.lfo_depth;
        let vd = self.delay.read_cubic(read_delay);

        // s[n] = x[n] + g*s[n-D],  y[n] = s[n-D] - g*s[n]
        // Alternating-sign bias prevents denormal accumulation without
        // adding DC.
        let vn = input + g * vd;
        let bias = if self.delay.cursor() & 1 == 1 {
            DENORMAL_BIAS
        } else {
            -DENORMAL_BIAS
        };
        self.delay.write(vn + bias);

        self.lfo_phase += self.lfo_phase_inc;
        if self.lfo_phase >= TWO_PI {
            self.lfo_phase -= TWO_PI;
        }

        vd - g * vn
    }

    pub fn clear(&mut self) {
        self.delay.clear();
    }
}

const INPUT_STAGES: usize = 4;
const INPUT_BASE_DELAYS: [usize; INPUT_STAGES] = [142, 107, 379, 277];

/// Cascaded modulated allpass input diffuser, 4 stages per channel.
///
/// Stages 1-2 run a higher coefficient than stages 3-4 (the Dattorro
/// split) so transients keep some definition.
#[derive(Debug)]
pub struct InputDiffusion {
    left: Vec<ModulatedAllpass>,
    right: Vec<ModulatedAllpass>,
    coeff_12: Sample,
    coeff_34: Sample,
    max_coeff_12: Sample,
    max_coeff_34: Sample,
    last_amount: Sample,
}

impl InputDiffusion {
    pub fn new(sample_rate: f64) -> Self {
        let ratio = sample_rate / 44100.0;
        let mut left = Vec::with_capacity(INPUT_STAGES);
        let mut right = Vec::with_capacity(INPUT_STAGES);

        for s in 0..INPUT_STAGES {
            let delay = INPUT_BASE_DELAYS[s] as f64 * ratio;
            let capacity = delay.ceil() as usize + 4;

            // 8 allpasses total; phase, rate and depth spread across them so
            // no two LFOs track each other
            let phase_l = TWO_PI * s as f64 / 8.0;
            let rate_l = 0.3 + 0.5 * s as f64 / 7.0;
            let depth_l = 0.5 + 1.0 * s as f64 / 7.0;
            left.push(ModulatedAllpass::new(
                capacity,
                delay,
                rate_l,
                depth_l,
                phase_l,
                sample_rate,
            ));

            let ri = (s + INPUT_STAGES) as f64;
            let phase_r = TWO_PI * ri / 8.0;
            let rate_r = 0.3 + 0.5 * ri / 7.0;
            let depth_r = 0.5 + 1.0 * ri / 7.0;
            right.push(ModulatedAllpass::new(
                capacity,
                delay,
                rate_r,
                depth_r,
                phase_r,
                sample_rate,
            ));
        }

        Self {
            left,
            right,
            coeff_12: 0.45,
            coeff_34: 0.375,
            max_coeff_12: 0.75,
            max_coeff_34: 0.625,
            last_amount: 0.6,
        }
    }

    #[inline(always)]
    pub fn process_sample(&mut self, left: Sample, right: Sample) -> (Sample, Sample) {
        let mut l = left;
        let mut r = right;
        for s in 0..INPUT_STAGES {
            let g = if s < 2 { self.coeff_12 } else { self.coeff_34 };
            l = self.left[s].process(l, g);
            r = self.right[s].process(r, g);
        }
        (l, r)
    }

    pub fn set_diffusion(&mut self, amount: Sample) {
        let a = amount.clamp(0.0, 1.0);
        self.last_amount = a;
        self.coeff_12 = a * self.max_coeff_12;
        self.coeff_34 = a * self.max_coeff_34;
    }

    /// Retarget the per-stage coefficient ceilings (algorithm change) and
    /// re-apply the current diffusion amount against them.
    pub fn set_max_coefficients(&mut self, max_12: Sample, max_34: Sample) {
        // Allpass stability requires |g| < 1
        self.max_coeff_12 = max_12.clamp(-0.999, 0.999);
        self.max_coeff_34 = max_34.clamp(-0.999, 0.999);
        self.set_diffusion(self.last_amount);
    }

    pub fn clear(&mut self) {
        for ap in self.left.iter_mut().chain(self.right.iter_mut()) {
            ap.clear();
        }
    }
}

const OUTPUT_STAGES: usize = 2;
const OUTPUT_BASE_DELAYS: [usize; OUTPUT_STAGES] = [523, 163];

/// Post-network output diffuser, 2 stages per channel.
#[derive(Debug)]
pub struct OutputDiffusion {
    left: Vec<ModulatedAllpass>,
    right: Vec<ModulatedAllpass>,
    coeff: Sample,
}

impl OutputDiffusion {
    pub fn new(sample_rate: f64) -> Self {
        let ratio = sample_rate / 44100.0;
        let mut left = Vec::with_capacity(OUTPUT_STAGES);
        let mut right = Vec::with_capacity(OUTPUT_STAGES);

        for s in 0..OUTPUT_STAGES {
            let delay = OUTPUT_BASE_DELAYS[s] as f64 * ratio;
            let capacity = delay.ceil() as usize + 4;
            let spread = (OUTPUT_STAGES * 2 - 1) as f64;

            // Light modulation: depth 0.3-0.5 samples, rate 0.2-0.5 Hz
            let phase_l = TWO_PI * s as f64 / 4.0;
            let rate_l = 0.2 + 0.3 * s as f64 / spread;
            let depth_l = 0.3 + 0.2 * s as f64 / spread;
            left.push(ModulatedAllpass::new(
                capacity,
                delay,
                rate_l,
                depth_l,
                phase_l,
                sample_rate,
            ));

            let ri = (s + OUTPUT_STAGES) as f64;
            let phase_r = TWO_PI * ri / 4.0;
            let rate_r = 0.2 + 0.3 * ri / spread;
            let depth_r = 0.3 + 0.2 * ri / spread;
            right.push(ModulatedAllpass::new(
                capacity,
                delay,
                rate_r,
                depth_r,
                phase_r,
                sample_rate,
            ));
        }

        Self {
            left,
            right,
            coeff: 0.4,
        }
    }

    #[inline(always)]
    pub fn process_sample(&mut self, left: Sample, right: Sample) -> (Sample, Sample) {
        let mut l = left;
        let mut r = right;
        for s in 0..OUTPUT_STAGES {
            l = self.left[s].process(l, self.coeff);
            r = self.right[s].process(r, self.coeff);
        }
        (l, r)
    }

    /// Maps amount 0..1 to coefficient 0..0.5.
    pub fn set_diffusion(&mut self, amount: Sample) {
        self.coeff = amount.clamp(0.0, 1.0) * 0.5;
    }

    pub fn clear(&mut self) {
        for ap in self.left.iter_mut().chain(self.right.iter_mut()) {
            ap.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allpass_zero_coefficient_is_pure_delay() {
        let mut ap = ModulatedAllpass::new(32, 8.0, 0.0, 0.0, 0.0, 48000.0);
        let mut outputs = Vec::new();
        for i in 0..24 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            outputs.push(ap.process(x, 0.0));
        }
        // With g = 0 the impulse emerges after exactly the delay length
        // (write-then-read ordering gives D samples of latency)
        let peak = outputs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 8);
    }

    #[test]
    fn test_allpass_energy_preserving() {
        // Unmodulated allpass passes all frequencies at unit magnitude; a
        // long white-ish input should come out with comparable energy.
        let mut ap = ModulatedAllpass::new(64, 17.0, 0.0, 0.0, 0.0, 48000.0);
        let mut in_energy = 0.0;
        let mut out_energy = 0.0;
        let mut x: f64 = 0.3;
        for _ in 0..50_000 {
            x = (x * 7.13 + 0.17).sin();
            let y = ap.process(x, 0.6);
            in_energy += x * x;
            out_energy += y * y;
        }
        let ratio = out_energy / in_energy;
        assert!((0.9..1.1).contains(&ratio), "energy ratio {ratio}");
    }

    #[test]
    fn test_allpass_stable_at_high_coefficient() {
        let mut ap = ModulatedAllpass::new(32, 11.0, 1.0, 0.5, 0.0, 48000.0);
        let mut peak: f64 = 0.0;
        for i in 0..100_000 {
            let x = if i < 100 { 0.5 } else { 0.0 };
            peak = peak.max(ap.process(x, 0.95).abs());
        }
        assert!(peak.is_finite());
        assert!(peak < 100.0);
    }

    #[test]
    fn test_input_diffusion_silence_in_silence_out() {
        let mut diff = InputDiffusion::new(48000.0);
        diff.set_diffusion(0.8);
        for _ in 0..10_000 {
            let (l, r) = diff.process_sample(0.0, 0.0);
            assert!(l.abs() < 1e-12 && r.abs() < 1e-12);
        }
    }

    #[test]
    fn test_input_diffusion_max_coeff_reapplies_amount() {
        let mut diff = InputDiffusion::new(48000.0);
        diff.set_diffusion(0.5);
        diff.set_max_coefficients(0.8, 0.8);
        assert!((diff.coeff_12 - 0.4).abs() < 1e-12);
        assert!((diff.coeff_34 - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_output_diffusion_coeff_mapping() {
        let mut diff = OutputDiffusion::new(48000.0);
        diff.set_diffusion(1.0);
        assert_eq!(diff.coeff, 0.5);
        diff.set_diffusion(2.0);
        assert_eq!(diff.coeff, 0.5);
        diff.set_diffusion(0.0);
        assert_eq!(diff.coeff, 0.0);
    }

    #[test]
    fn test_diffusers_bounded_on_sustained_input() {
        let mut input = InputDiffusion::new(44100.0);
        let mut output = OutputDiffusion::new(44100.0);
        input.set_diffusion(1.0);
        output.set_diffusion(1.0);

        let mut peak: f64 = 0.0;
        for i in 0..44_100 {
            let x = (TWO_PI * 440.0 * i as f64 / 44100.0).sin() * 0.5;
            let (l, r) = input.process_sample(x, -x);
            let (l, r) = output.process_sample(l, r);
            peak = peak.max(l.abs()).max(r.abs());
        }
        assert!(peak.is_finite());
        assert!(peak < 10.0);
    }
}
