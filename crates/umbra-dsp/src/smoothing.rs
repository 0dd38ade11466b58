//! Lock-free parameter smoothing
//!
//! One-pole exponential smoothing toward an atomically-published target.
//! A control/UI thread may store new targets at any time (word-level atomic
//! writes, no tearing); the audio thread advances the smoothed value one
//! sample at a time with zero allocation and no locks, eliminating zipper
//! noise from block-rate parameter updates.

use std::sync::atomic::{AtomicU64, Ordering};

use umbra_core::Sample;

#[derive(Debug)]
pub struct SmoothedParam {
    /// Target value bits (set from the control thread)
    target: AtomicU64,
    /// Current smoothed value (audio thread only)
    current: Sample,
    /// One-pole coefficient derived from the smoothing time constant
    coeff: Sample,
    min_value: Sample,
    max_value: Sample,
}

impl SmoothedParam {
    pub fn new(initial_value: Sample, smoothing_time_ms: f64, sample_rate: f64) -> Self {
        Self {
            target: AtomicU64::new(initial_value.to_bits()),
            current: initial_value,
            coeff: Self::calculate_coeff(smoothing_time_ms, sample_rate),
            min_value: f64::NEG_INFINITY,
            max_value: f64::INFINITY,
        }
    }

    /// Create with a clamped value range applied at the setter boundary.
    pub fn with_range(
        initial_value: Sample,
        smoothing_time_ms: f64,
        sample_rate: f64,
        min: Sample,
        max: Sample,
    ) -> Self {
        let mut param = Self::new(initial_value, smoothing_time_ms, sample_rate);
        param.min_value = min;
        param.max_value = max;
        param
    }

    fn calculate_coeff(time_ms: f64, sample_rate: f64) -> Sample {
        let samples = (time_ms / 1000.0) * sample_rate;
        if samples <= 0.0 {
            1.0
        } else {
            // Reach ~63% of the remaining distance per time constant
            1.0 - (-1.0 / samples).exp()
        }
    }

    /// Set target value (thread-safe, call from the control thread).
    #[inline]
    pub fn set_target(&self, value: Sample) {
        let clamped = value.clamp(self.min_value, self.max_value);
        self.target.store(clamped.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn target(&self) -> Sample {
        f64::from_bits(self.target.load(Ordering::Relaxed))
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn current(&self) -> Sample {
        self.current
    }

    /// Jump to a value immediately (initialization / reset).
    pub fn set_immediate(&mut self, value: Sample) {
        let clamped = value.clamp(self.min_value, self.max_value);
        self.current = clamped;
        self.target.store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Advance one sample toward the target and return the new value.
    #[inline(always)]
    pub fn next(&mut self) -> Sample {
        self.current += self.coeff * (self.target() - self.current);
        self.current
    }
}
