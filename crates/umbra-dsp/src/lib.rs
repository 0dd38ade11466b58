//! umbra-dsp: The Umbra reverb engine
//!
//! A real-time algorithmic reverb built around a 16-line feedback delay
//! network with Hadamard feedback mixing, two-band frequency-dependent
//! decay, modulated allpass diffusion, and a discrete early-reflections
//! generator.
//!
//! ## Modules
//! - `math` - interpolation, soft clipping, power-of-two helpers
//! - `delay_line` - fractional delay line with cubic Hermite reads
//! - `biquad` - TDF-II biquad filters (Butterworth lo-cut / hi-cut)
//! - `smoothing` - lock-free one-pole parameter smoothing
//! - `damping` - two-band shelving damping for feedback loops
//! - `algorithm` - immutable per-algorithm configuration tables
//! - `diffusion` - modulated allpass input/output diffusion cascades
//! - `early` - multi-tap early reflections generator
//! - `fdn` - 16-line feedback delay network core
//! - `engine` - the full reverb pipeline and algorithm crossfading

pub mod algorithm;
pub mod biquad;
pub mod damping;
pub mod delay_line;
pub mod diffusion;
pub mod early;
pub mod engine;
pub mod fdn;
pub mod math;
pub mod smoothing;

use umbra_core::Sample;

/// Trait for all DSP processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
