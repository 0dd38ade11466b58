//! Small DSP math helpers shared across the reverb components

use umbra_core::Sample;

pub const TWO_PI: f64 = std::f64::consts::TAU;

/// Tiny bias added with alternating sign to feedback paths to prevent
/// denormal accumulation. Small enough to be inaudible but keeps the FPU
/// out of slow denormal mode.
pub const DENORMAL_BIAS: Sample = 1.0e-15;

/// Smallest power of two >= `v`. Returns 1 for `v <= 1`.
#[inline]
pub fn next_power_of_two(v: usize) -> usize {
    v.max(1).next_power_of_two()
}

/// Cubic Hermite (Catmull-Rom) interpolation for fractional delay reads.
///
/// `idx` is the integer part of the read position (may be negative before
/// wrapping), `frac` is in 0..1. Neighbor reads wrap through the
/// power-of-two `mask`, so the read never indexes outside the buffer.
#[inline(always)]
pub fn cubic_hermite(buffer: &[Sample], mask: usize, idx: isize, frac: f64) -> Sample {
    let m = mask as isize;
    let y0 = buffer[((idx - 1) & m) as usize];
    let y1 = buffer[(idx & m) as usize];
    let y2 = buffer[((idx + 1) & m) as usize];
    let y3 = buffer[((idx + 2) & m) as usize];

    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);

    ((c3 * frac + c2) * frac + c1) * frac + c0
}

/// Fast rational tanh approximation: x*(27+x^2)/(27+9x^2).
///
/// Close to tanh over the |x| < 3 range the soft clipper sees; avoids the
/// expensive exp path of `f64::tanh`. Used as the FDN output soft clipper.
#[inline(always)]
pub fn fast_tanh(x: Sample) -> Sample {
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(1024), 1024);
        assert_eq!(next_power_of_two(1025), 2048);
    }

    #[test]
    fn test_cubic_hermite_passes_through_samples() {
        let buffer = [0.0, 1.0, 0.5, -0.25, 0.75, 0.0, 0.0, 0.0];
        // frac = 0 must return buffer[idx] exactly
        for idx in 0..4 {
            assert_abs_diff_eq!(
                cubic_hermite(&buffer, 7, idx as isize, 0.0),
                buffer[idx],
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_cubic_hermite_negative_index_wraps() {
        let buffer = [1.0, 2.0, 3.0, 4.0];
        // idx -1 wraps to buffer[3]
        assert_abs_diff_eq!(cubic_hermite(&buffer, 3, -1, 0.0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fast_tanh_tracks_tanh() {
        for i in -30..=30 {
            let x = i as f64 * 0.1;
            assert_abs_diff_eq!(fast_tanh(x), x.tanh(), epsilon = 0.025);
        }
        // Linear near zero, saturating toward 1 at the clip knee
        assert_eq!(fast_tanh(0.0), 0.0);
        assert_abs_diff_eq!(fast_tanh(0.01), 0.01, epsilon = 1e-5);
        assert_abs_diff_eq!(fast_tanh(3.0), 1.0, epsilon = 1e-12);
        // Odd symmetry
        assert_eq!(fast_tanh(-1.3), -fast_tanh(1.3));
    }
}
