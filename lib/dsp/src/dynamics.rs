//! Noise gate and soft clipper.

/// Default gate threshold (about -36 dBFS).
pub const GATE_THRESHOLD: u16 = 512;

/// Gain applied below the gate threshold, Q15 (about 0.1).
pub const GATE_ATTENUATION_Q15: i32 = 3277;

/// Soft clipping starts here.
pub const CLIP_THRESHOLD: i32 = 28000;

/// Soft clipper ceiling.
pub const CLIP_MAX: i32 = 32767;

/// Attenuate (rather than zero) samples quieter than `threshold`.
#[inline]
pub fn noise_gate(x: i16, threshold: u16) -> i16 {
    let wide = x as i32;
    if wide.abs() < threshold as i32 {
        ((wide * GATE_ATTENUATION_Q15) >> 15) as i16
    } else {
        x
    }
}

/// Half-scale smoothstep `(3t² - 2t³) / 2` for `t` in Q16 `[0, 1]`.
#[inline]
fn knee_curve(t: i64) -> i64 {
    let t2 = (t * t) >> 16;
    let t3 = (t2 * t) >> 16;
    ((3 * t2) >> 1) - ((2 * t3) >> 1)
}

/// Compress the region above [`CLIP_THRESHOLD`] along a cubic knee.
///
/// Output magnitude never exceeds [`CLIP_MAX`] and is monotonic in the input.
#[inline]
pub fn soft_clip(x: i16) -> i16 {
    let s = x as i64;
    let threshold = CLIP_THRESHOLD as i64;
    let range = (CLIP_MAX - CLIP_THRESHOLD) as i64;
    let magnitude = s.abs();
    if magnitude <= threshold {
        return x;
    }

    let t = (((magnitude - threshold) << 16) / range).min(1 << 16);
    let shaped = (threshold + ((range * knee_curve(t)) >> 16)).min(CLIP_MAX as i64);
    if s < 0 {
        -shaped as i16
    } else {
        shaped as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_attenuates_quiet_samples() {
        assert_eq!(noise_gate(100, GATE_THRESHOLD), 10);
        assert_eq!(noise_gate(-100, GATE_THRESHOLD), -11);
        assert_eq!(noise_gate(512, GATE_THRESHOLD), 512);
        assert_eq!(noise_gate(i16::MIN, GATE_THRESHOLD), i16::MIN);
    }

    #[test]
    fn test_soft_clip_passes_below_threshold() {
        for x in [-28000i16, -1, 0, 1, 12345, 28000] {
            assert_eq!(soft_clip(x), x);
        }
    }

    #[test]
    fn test_soft_clip_curve() {
        assert_eq!(soft_clip(30000), 28906);
        assert_eq!(soft_clip(-30000), -28906);
        assert_eq!(soft_clip(i16::MAX), 30383);
        assert_eq!(soft_clip(i16::MIN), -30383);
    }

    #[test]
    fn test_soft_clip_is_monotonic() {
        let mut prev = soft_clip(i16::MIN);
        for x in (i16::MIN as i32 + 1)..=(i16::MAX as i32) {
            let y = soft_clip(x as i16);
            assert!(y >= prev, "not monotonic at {}", x);
            prev = y;
        }
    }
}
