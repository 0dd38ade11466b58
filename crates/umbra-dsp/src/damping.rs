//! Two-band shelving damping filter for FDN feedback loops
//!
//! A first-order lowpass at the crossover frequency splits the signal,
//! then independent gains apply below (`g_low`) and above (`g_high`) the
//! crossover. This is the classic "bass multiply / treble multiply"
//! architecture: lows can sustain longer than mids (bass multiply > 1)
//! while highs roll off faster (treble multiply < 1).

use umbra_core::Sample;

#[derive(Debug, Clone, Default)]
pub struct TwoBandDamping {
    g_low: Sample,
    g_high: Sample,
    lp_coeff: Sample,
    lp_state: Sample,
}

impl TwoBandDamping {
    pub fn new() -> Self {
        Self {
            g_low: 1.0,
            g_high: 1.0,
            lp_coeff: 0.0,
            lp_state: 0.0,
        }
    }

    /// `crossover_coeff` is `exp(-2*pi*fc/sr)`; `g_low`/`g_high` are the
    /// per-delay-pass gains below/above the crossover.
    pub fn set_coefficients(&mut self, g_low: Sample, g_high: Sample, crossover_coeff: Sample) {
        self.g_low = g_low;
        self.g_high = g_high;
        self.lp_coeff = crossover_coeff;
    }

    #[inline(always)]
    pub fn process(&mut self, input: Sample) -> Sample {
        // First-order lowpass at crossover: lp[n] = (1-c)*x[n] + c*lp[n-1]
        self.lp_state = (1.0 - self.lp_coeff) * input + self.lp_coeff * self.lp_state;

        // output = g_high * x + (g_low - g_high) * lp
        // At DC: lp -> x, so output -> g_low * x
        // At Nyquist: lp -> 0, so output -> g_high * x
        self.g_high * input + (self.g_low - self.g_high) * self.lp_state
    }

    pub fn reset(&mut self) {
        self.lp_state = 0.0;
    }
}
