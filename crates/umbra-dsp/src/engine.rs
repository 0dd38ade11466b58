//! Reverb engine orchestrator
//!
//! Wires the signal chain together: pre-delay, input bandwidth filter, the
//! early reflection branch and the diffusion -> FDN -> output diffusion
//! late branch, followed by DC blocking, output EQ, stereo width and the
//! smoothed dry/wet mix. Also owns the algorithm crossfade state machine
//! and re-applies cached parameters when the algorithm changes.

use umbra_core::{Algorithm, ReverbParams, Sample, StereoSample, UmbraError, UmbraResult};

use crate::algorithm::{self, AlgorithmConfig};
use crate::biquad::{BUTTERWORTH_Q, BiquadTDF2};
use crate::delay_line::FractionalDelayLine;
use crate::diffusion::{InputDiffusion, OutputDiffusion};
use crate::early::EarlyReflections;
use crate::fdn::FdnCore;
use crate::math::TWO_PI;
use crate::smoothing::SmoothedParam;
use crate::{MonoProcessor, Processor};

const MAX_PRE_DELAY_MS: f64 = 250.0;
const SMOOTH_TIME_MS: f64 = 5.0;
const FADE_SAMPLES: u32 = 64;

/// Algorithm switch crossfade. The wet signal ramps to silence, the new
/// configuration is applied at the zero crossing, then the wet signal
/// ramps back in. 64 samples each way is short enough to read as
/// instantaneous but long enough to avoid clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeState {
    Stable,
    FadingOut { pending: Algorithm, counter: u32 },
    FadingIn { counter: u32 },
}

/// First-order DC blocker: `y[n] = x[n] - x[n-1] + R*y[n-1]`, pole near
/// 5 Hz. The FDN's asymmetric input injection can leave a small offset.
#[derive(Debug, Clone, Copy, Default)]
struct DcBlocker {
    coeff: f64,
    x1: Sample,
    y1: Sample,
}

impl DcBlocker {
    fn new(sample_rate: f64) -> Self {
        Self {
            coeff: 1.0 - TWO_PI * 5.0 / sample_rate,
            x1: 0.0,
            y1: 0.0,
        }
    }

    #[inline(always)]
    fn process(&mut self, input: Sample) -> Sample {
        let output = input - self.x1 + self.coeff * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

#[derive(Debug)]
pub struct ReverbEngine {
    input_diffusion: InputDiffusion,
    fdn: FdnCore,
    output_diffusion: OutputDiffusion,
    early: EarlyReflections,

    config: &'static AlgorithmConfig,
    current_algorithm: Algorithm,

    pre_delay_l: FractionalDelayLine,
    pre_delay_r: FractionalDelayLine,
    pre_delay_samples: usize,

    scratch_l: Vec<Sample>,
    scratch_r: Vec<Sample>,
    er_out_l: Vec<Sample>,
    er_out_r: Vec<Sample>,

    mix: SmoothedParam,
    er_level: SmoothedParam,
    width: SmoothedParam,
    lo_cut: SmoothedParam,
    hi_cut: SmoothedParam,

    er_level_scale: f64,
    late_gain_scale: f64,

    decay_time: f64,

    // Raw parameter values cached for re-application after an algorithm
    // switch, so the new config's scale factors compose correctly
    last_diffusion: f64,
    last_output_diffusion: f64,
    last_mod_depth: f64,
    last_mod_rate: f64,
    last_treble_mult: f64,
    last_bass_mult: f64,
    last_er_level: f64,

    input_bw_coeff: f64,
    input_bw_state_l: Sample,
    input_bw_state_r: Sample,

    dc_blocker_l: DcBlocker,
    dc_blocker_r: DcBlocker,

    // Output EQ on the wet signal only; coefficients shared per pair
    lo_cut_filter_l: BiquadTDF2,
    lo_cut_filter_r: BiquadTDF2,
    hi_cut_filter_l: BiquadTDF2,
    hi_cut_filter_r: BiquadTDF2,
    lo_cut_hz: f64,
    hi_cut_hz: f64,

    frozen: bool,

    fade: FadeState,
    first_algorithm_set: bool,

    sample_rate: f64,
    max_block_size: usize,
    prepared: bool,
}

impl ReverbEngine {
    pub fn new() -> Self {
        Self::build(44100.0, 512)
    }

    fn build(sample_rate: f64, max_block_size: usize) -> Self {
        let config = algorithm::config(Algorithm::Hall);
        let pre_delay_capacity = (MAX_PRE_DELAY_MS * 0.001 * sample_rate).ceil() as usize + 1;

        Self {
            input_diffusion: InputDiffusion::new(sample_rate),
            fdn: FdnCore::new(sample_rate),
            output_diffusion: OutputDiffusion::new(sample_rate),
            early: EarlyReflections::new(sample_rate),

            config,
            current_algorithm: Algorithm::Hall,

            pre_delay_l: FractionalDelayLine::new(pre_delay_capacity),
            pre_delay_r: FractionalDelayLine::new(pre_delay_capacity),
            pre_delay_samples: 0,

            scratch_l: vec![0.0; max_block_size],
            scratch_r: vec![0.0; max_block_size],
            er_out_l: vec![0.0; max_block_size],
            er_out_r: vec![0.0; max_block_size],

            mix: SmoothedParam::with_range(1.0, SMOOTH_TIME_MS, sample_rate, 0.0, 1.0),
            er_level: SmoothedParam::with_range(0.5, SMOOTH_TIME_MS, sample_rate, 0.0, 1.0),
            width: SmoothedParam::with_range(1.0, SMOOTH_TIME_MS, sample_rate, 0.0, 2.0),
            lo_cut: SmoothedParam::with_range(20.0, SMOOTH_TIME_MS, sample_rate, 20.0, 500.0),
            hi_cut: SmoothedParam::with_range(
                20000.0,
                SMOOTH_TIME_MS,
                sample_rate,
                1000.0,
                20000.0,
            ),

            er_level_scale: config.er_level_scale,
            late_gain_scale: config.late_gain_scale,

            decay_time: 2.5,

            last_diffusion: 0.75,
            last_output_diffusion: 0.5,
            last_mod_depth: 0.4,
            last_mod_rate: 0.8,
            last_treble_mult: 0.5,
            last_bass_mult: 1.2,
            last_er_level: 0.5,

            input_bw_coeff: (-TWO_PI * config.bandwidth_hz / sample_rate).exp(),
            input_bw_state_l: 0.0,
            input_bw_state_r: 0.0,

            dc_blocker_l: DcBlocker::new(sample_rate),
            dc_blocker_r: DcBlocker::new(sample_rate),

            lo_cut_filter_l: BiquadTDF2::new(sample_rate),
            lo_cut_filter_r: BiquadTDF2::new(sample_rate),
            hi_cut_filter_l: BiquadTDF2::new(sample_rate),
            hi_cut_filter_r: BiquadTDF2::new(sample_rate),
            lo_cut_hz: 20.0,
            hi_cut_hz: 20000.0,

            frozen: false,

            fade: FadeState::Stable,
            first_algorithm_set: true,

            sample_rate,
            max_block_size,
            prepared: false,
        }
    }

    /// Allocate and configure for the given sample rate and maximum block
    /// size. Must be called before `process`; may be called again to
    /// reconfigure. All audio state is reset.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> UmbraResult<()> {
        if !sample_rate.is_finite() || !(8000.0..=384_000.0).contains(&sample_rate) {
            return Err(UmbraError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(UmbraError::InvalidBlockSize(max_block_size));
        }

        let mut engine = Self::build(sample_rate, max_block_size);
        engine.prepared = true;
        *self = engine;

        log::debug!("reverb engine prepared: sr={sample_rate}, max_block={max_block_size}");
        Ok(())
    }

    /// Process a stereo block in place: the buffers carry the dry input in
    /// and the dry/wet mix out. Blocks larger than the prepared maximum
    /// are handled in chunks. Before `prepare` this is a no-op.
    pub fn process(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        if !self.prepared {
            return;
        }

        let n = left.len().min(right.len());
        let (left, right) = (&mut left[..n], &mut right[..n]);

        let max = self.max_block_size;
        for (l_chunk, r_chunk) in left.chunks_mut(max).zip(right.chunks_mut(max)) {
            self.process_chunk(l_chunk, r_chunk);
        }
    }

    fn process_chunk(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        let n = left.len();

        // Wet path works on scratch; left/right keep the dry signal for
        // the final mix
        self.scratch_l[..n].copy_from_slice(left);
        self.scratch_r[..n].copy_from_slice(right);

        // Pre-delay
        if self.pre_delay_samples > 0 {
            for i in 0..n {
                self.pre_delay_l.write(self.scratch_l[i]);
                self.pre_delay_r.write(self.scratch_r[i]);
                self.scratch_l[i] = self.pre_delay_l.read(self.pre_delay_samples);
                self.scratch_r[i] = self.pre_delay_r.read(self.pre_delay_samples);
            }
        }

        // Input bandwidth: gentle one-pole lowpass softening transients
        // before diffusion
        for i in 0..n {
            self.input_bw_state_l = (1.0 - self.input_bw_coeff) * self.scratch_l[i]
                + self.input_bw_coeff * self.input_bw_state_l;
            self.scratch_l[i] = self.input_bw_state_l;

            self.input_bw_state_r = (1.0 - self.input_bw_coeff) * self.scratch_r[i]
                + self.input_bw_coeff * self.input_bw_state_r;
            self.scratch_r[i] = self.input_bw_state_r;
        }

        // Early reflections read the pre-delayed input before diffusion
        // smears it. Frozen mode mutes new reflections.
        if self.frozen {
            self.er_out_l[..n].fill(0.0);
            self.er_out_r[..n].fill(0.0);
        } else {
            self.early.begin_block();
            for i in 0..n {
                let (l, r) = self.early.process_sample(self.scratch_l[i], self.scratch_r[i]);
                self.er_out_l[i] = l;
                self.er_out_r[i] = r;
            }
        }

        // Late branch: input diffusion -> FDN -> output diffusion. Frozen
        // mode mutes the FDN input so only the captured tail circulates.
        if self.frozen {
            self.scratch_l[..n].fill(0.0);
            self.scratch_r[..n].fill(0.0);
        } else {
            for i in 0..n {
                let (l, r) = self
                    .input_diffusion
                    .process_sample(self.scratch_l[i], self.scratch_r[i]);
                self.scratch_l[i] = l;
                self.scratch_r[i] = r;
            }
        }

        for i in 0..n {
            let (l, r) = self.fdn.process_sample(self.scratch_l[i], self.scratch_r[i]);
            let (l, r) = self.output_diffusion.process_sample(l, r);
            self.scratch_l[i] = l;
            self.scratch_r[i] = r;
        }

        // Output stage, per sample so smoothed parameters stay zipper-free
        for i in 0..n {
            let mix = self.mix.next();
            let er = self.er_level.next();
            let w = self.width.next();
            let wet = mix;
            let dry = 1.0 - mix;

            // Dead-band gate on the EQ cutoffs so coefficient updates only
            // happen on audible movement
            let lo_hz = self.lo_cut.next();
            if (lo_hz - self.lo_cut_hz).abs() > 0.5 {
                self.lo_cut_hz = lo_hz;
                self.lo_cut_filter_l.set_highpass(lo_hz, BUTTERWORTH_Q);
                self.lo_cut_filter_r.set_highpass(lo_hz, BUTTERWORTH_Q);
            }
            let hi_hz = self.hi_cut.next();
            if (hi_hz - self.hi_cut_hz).abs() > 1.0 {
                self.hi_cut_hz = hi_hz;
                self.hi_cut_filter_l.set_lowpass(hi_hz, BUTTERWORTH_Q);
                self.hi_cut_filter_r.set_lowpass(hi_hz, BUTTERWORTH_Q);
            }

            let wet_l = self.scratch_l[i] * self.late_gain_scale + self.er_out_l[i] * er;
            let wet_r = self.scratch_r[i] * self.late_gain_scale + self.er_out_r[i] * er;

            let mut out_l = self.dc_blocker_l.process(wet_l);
            let mut out_r = self.dc_blocker_r.process(wet_r);

            out_l = self.lo_cut_filter_l.process_sample(out_l);
            out_r = self.lo_cut_filter_r.process_sample(out_r);
            out_l = self.hi_cut_filter_l.process_sample(out_l);
            out_r = self.hi_cut_filter_r.process_sample(out_r);

            // Mid/side width
            let mut ms = StereoSample::new(out_l, out_r).to_mid_side();
            ms.side *= w;
            let widened = ms.to_stereo();
            out_l = widened.left;
            out_r = widened.right;

            // Algorithm crossfade gain
            match self.fade {
                FadeState::Stable => {}
                FadeState::FadingOut { pending, counter } => {
                    let gain = counter as f64 / FADE_SAMPLES as f64;
                    out_l *= gain;
                    out_r *= gain;

                    if counter <= 1 {
                        // Zero crossing: retune everything, then ramp back
                        self.apply_algorithm(pending);
                        self.fade = FadeState::FadingIn { counter: 0 };
                    } else {
                        self.fade = FadeState::FadingOut {
                            pending,
                            counter: counter - 1,
                        };
                    }
                }
                FadeState::FadingIn { counter } => {
                    let gain = counter as f64 / FADE_SAMPLES as f64;
                    out_l *= gain;
                    out_r *= gain;

                    self.fade = if counter + 1 >= FADE_SAMPLES {
                        FadeState::Stable
                    } else {
                        FadeState::FadingIn {
                            counter: counter + 1,
                        }
                    };
                }
            }

            left[i] = left[i] * dry + out_l * wet;
            right[i] = right[i] * dry + out_r * wet;
        }
    }

    /// Select a reverb algorithm. The first call after `prepare` applies
    /// immediately; later calls crossfade through silence during `process`
    /// to avoid clicks. A request made while a fade is in flight is
    /// dropped.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        if self.first_algorithm_set {
            self.first_algorithm_set = false;
            self.apply_algorithm(algorithm);
            return;
        }
        if algorithm == self.current_algorithm {
            return;
        }
        if self.fade == FadeState::Stable {
            self.fade = FadeState::FadingOut {
                pending: algorithm,
                counter: FADE_SAMPLES,
            };
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.current_algorithm
    }

    fn apply_algorithm(&mut self, algorithm: Algorithm) {
        self.current_algorithm = algorithm;
        self.config = algorithm::config(algorithm);

        self.fdn.apply_config(self.config);
        self.input_diffusion.set_max_coefficients(
            self.config.input_diff_max_coeff_12,
            self.config.input_diff_max_coeff_34,
        );
        self.early.set_time_scale(self.config.er_time_scale);
        self.input_bw_coeff = (-TWO_PI * self.config.bandwidth_hz / self.sample_rate).exp();

        self.er_level_scale = self.config.er_level_scale;
        self.late_gain_scale = self.config.late_gain_scale;

        // Re-apply cached raw values so the new config's scale factors
        // take effect
        self.set_mod_depth(self.last_mod_depth);
        self.set_mod_rate(self.last_mod_rate);
        self.set_treble_multiply(self.last_treble_mult);
        self.set_bass_multiply(self.last_bass_mult);
        self.set_er_level(self.last_er_level);
        self.set_diffusion(self.last_diffusion);
        self.set_output_diffusion(self.last_output_diffusion);

        log::debug!("reverb algorithm applied: {}", self.config.name);
    }

    pub fn set_decay_time(&mut self, seconds: f64) {
        self.decay_time = seconds;
        self.fdn.set_decay_time(seconds);
        // Output diffusion is decay-linked; retarget it
        self.set_output_diffusion(self.last_output_diffusion);
    }

    pub fn set_bass_multiply(&mut self, mult: f64) {
        self.last_bass_mult = mult;
        self.fdn.set_bass_multiply(mult * self.config.bass_mult_scale);
    }

    pub fn set_treble_multiply(&mut self, mult: f64) {
        self.last_treble_mult = mult;
        self.fdn.set_treble_multiply(mult * self.config.treble_mult_scale);
    }

    pub fn set_crossover_freq(&mut self, hz: f64) {
        self.fdn.set_crossover_freq(hz);
    }

    pub fn set_mod_depth(&mut self, depth: f64) {
        self.last_mod_depth = depth;
        self.fdn.set_mod_depth(depth * self.config.mod_depth_scale);
    }

    pub fn set_mod_rate(&mut self, hz: f64) {
        self.last_mod_rate = hz;
        self.fdn.set_mod_rate(hz * self.config.mod_rate_scale);
    }

    pub fn set_size(&mut self, size: f64) {
        self.fdn.set_size(size);
    }

    pub fn set_pre_delay(&mut self, milliseconds: f64) {
        let ms = milliseconds.clamp(0.0, MAX_PRE_DELAY_MS);
        self.pre_delay_samples = (ms * 0.001 * self.sample_rate) as usize;
    }

    pub fn set_diffusion(&mut self, amount: f64) {
        self.last_diffusion = amount;
        self.input_diffusion.set_diffusion(amount);
    }

    /// Output diffusion is limited at long decay times to keep the
    /// allpasses from ringing on top of an already-dense tail.
    pub fn set_output_diffusion(&mut self, amount: f64) {
        self.last_output_diffusion = amount;
        let decay_factor = (5.0 / self.decay_time.max(0.2)).clamp(0.4, 1.0);
        self.output_diffusion
            .set_diffusion(amount * decay_factor * self.config.output_diff_scale);
    }

    pub fn set_er_level(&mut self, level: f64) {
        self.last_er_level = level;
        self.er_level.set_target(level * self.er_level_scale);
    }

    pub fn set_er_size(&mut self, size: f64) {
        self.early.set_size(size);
    }

    pub fn set_mix(&mut self, dry_wet: f64) {
        self.mix.set_target(dry_wet);
    }

    pub fn set_lo_cut(&mut self, hz: f64) {
        self.lo_cut.set_target(hz);
    }

    pub fn set_hi_cut(&mut self, hz: f64) {
        self.hi_cut.set_target(hz);
    }

    pub fn set_width(&mut self, width: f64) {
        self.width.set_target(width);
    }

    pub fn set_freeze(&mut self, frozen: bool) {
        if frozen != self.frozen {
            self.frozen = frozen;
            self.fdn.set_freeze(frozen);
        }
    }

    /// Apply a full parameter snapshot. Values are clamped to their
    /// documented ranges first.
    pub fn set_params(&mut self, params: &ReverbParams) {
        let p = params.clamped();
        self.set_algorithm(p.algorithm);
        self.set_decay_time(p.decay_time_s);
        self.set_bass_multiply(p.bass_multiply);
        self.set_treble_multiply(p.treble_multiply);
        self.set_crossover_freq(p.crossover_hz);
        self.set_mod_depth(p.mod_depth);
        self.set_mod_rate(p.mod_rate_hz);
        self.set_size(p.size);
        self.set_pre_delay(p.pre_delay_ms);
        self.set_diffusion(p.diffusion);
        self.set_output_diffusion(p.output_diffusion);
        self.set_er_level(p.er_level);
        self.set_er_size(p.er_size);
        self.set_mix(p.mix);
        self.set_lo_cut(p.lo_cut_hz);
        self.set_hi_cut(p.hi_cut_hz);
        self.set_width(p.width);
        self.set_freeze(p.freeze);
    }
}

impl Default for ReverbEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ReverbEngine {
    /// Clear all audio state without touching parameters.
    fn reset(&mut self) {
        self.input_diffusion.clear();
        self.fdn.clear();
        self.output_diffusion.clear();
        self.early.clear();
        self.pre_delay_l.clear();
        self.pre_delay_r.clear();
        self.input_bw_state_l = 0.0;
        self.input_bw_state_r = 0.0;
        self.dc_blocker_l.reset();
        self.dc_blocker_r.reset();
        self.lo_cut_filter_l.reset();
        self.lo_cut_filter_r.reset();
        self.hi_cut_filter_l.reset();
        self.hi_cut_filter_r.reset();
    }
}
