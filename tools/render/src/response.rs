//! `response` subcommand: magnitude response of every filter setting.
//!
//! Evaluated from the quantised Q16 coefficients the engine actually runs,
//! so rounding in the fixed-point tables shows up in the numbers.

use std::f32::consts::PI;

use anyhow::{bail, Result};

use chime_dsp::dc_block::{HARD_ALPHA, SOFT_ALPHA};
use chime_dsp::lowpass::cutoff_from_alpha;
use chime_dsp::q16::ONE;
use chime_dsp::shelf::{gain_q16_from_db, CUTOFF_ALPHA, PRESETS_DB};
use chime_dsp::BiquadCoeffs;
use chime_engine::config::LPF8_MAKEUP_DEFAULT_Q16;
use chime_engine::engine::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use chime_engine::LpfLevel;

/// Octave probe points.
const FREQUENCIES: [f32; 9] = [
    63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Transfer function `B(z) / A(z)` in `z⁻¹` powers, unit-normalised.
struct Response {
    b: Vec<f32>,
    a: Vec<f32>,
}

impl Response {
    fn biquad(alpha: u16) -> Self {
        let c = BiquadCoeffs::from_alpha(alpha);
        let q = |v: i32| v as f32 / ONE as f32;
        Self {
            b: vec![q(c.b0), q(c.b1), q(c.b2)],
            a: vec![1.0, q(c.a1), q(c.a2)],
        }
    }

    fn one_pole(alpha: u16, makeup_q16: u32) -> Self {
        let alpha = alpha as f32 / ONE as f32;
        let makeup = makeup_q16 as f32 / ONE as f32;
        Self { b: vec![alpha * makeup], a: vec![1.0, -(1.0 - alpha)] }
    }

    fn dc_blocker(alpha: u16) -> Self {
        let alpha = alpha as f32 / ONE as f32;
        Self { b: vec![1.0, -1.0], a: vec![1.0, -alpha] }
    }

    fn air_shelf(gain_q16: u32) -> Self {
        let alpha = CUTOFF_ALPHA as f32 / ONE as f32;
        let boost = gain_q16 as f32 / ONE as f32 * (1.0 - alpha);
        Self { b: vec![alpha + boost, -boost], a: vec![1.0, -(1.0 - alpha)] }
    }

    /// |H| in dB at `freq` Hz.
    fn db_at(&self, freq: f32, rate: u32) -> f32 {
        let w = 2.0 * PI * freq / rate as f32;
        let num = magnitude(&self.b, w);
        let den = magnitude(&self.a, w);
        if num <= 0.0 || den <= 0.0 {
            return f32::NEG_INFINITY;
        }
        20.0 * (num / den).log10()
    }
}

/// |Σ cₖ e^{-jwk}|
fn magnitude(coeffs: &[f32], w: f32) -> f32 {
    let (re, im) = coeffs
        .iter()
        .enumerate()
        .fold((0.0f32, 0.0f32), |(re, im), (k, c)| {
            let phase = w * k as f32;
            (re + c * phase.cos(), im - c * phase.sin())
        });
    re.hypot(im)
}

pub fn print(rate: u32) -> Result<()> {
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
        bail!("rate {} Hz outside {}..={}", rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE);
    }
    let nyquist = rate as f32 / 2.0;
    let freqs: Vec<f32> = FREQUENCIES.iter().copied().filter(|&f| f < nyquist).collect();

    println!("Magnitude response at {} Hz (dB)", rate);

    print_header("16-bit biquad", &freqs);
    for level in fixed_levels() {
        let alpha = level.biquad_alpha(0).unwrap_or(0);
        let label = format!("{} ({:.0} Hz)", level.name(), cutoff_from_alpha(alpha, rate));
        print_row(&label, &Response::biquad(alpha), &freqs, rate);
    }

    print_header("8-bit one-pole", &freqs);
    for level in fixed_levels() {
        let alpha = level.one_pole_alpha(0).unwrap_or(0);
        let label = format!("{} ({:.0} Hz)", level.name(), one_pole_cutoff_hz(alpha, rate));
        print_row(&label, &Response::one_pole(alpha, LPF8_MAKEUP_DEFAULT_Q16), &freqs, rate);
    }

    print_header("DC blocker", &freqs);
    print_row("hard", &Response::dc_blocker(HARD_ALPHA), &freqs, rate);
    print_row("soft", &Response::dc_blocker(SOFT_ALPHA), &freqs, rate);

    print_header("Air presets", &freqs);
    for (index, db) in PRESETS_DB.iter().enumerate().skip(1) {
        let label = format!("{} (+{:.0} dB)", index, db);
        print_row(&label, &Response::air_shelf(gain_q16_from_db(*db)), &freqs, rate);
    }
    Ok(())
}

/// Levels with a fixed alpha (not `Off`, not `Custom`).
fn fixed_levels() -> impl Iterator<Item = LpfLevel> {
    LpfLevel::ALL
        .into_iter()
        .filter(|level| !matches!(level, LpfLevel::Off | LpfLevel::Custom))
}

/// The one-pole's alpha is its input weight, so its pole sits at `1 - alpha`.
fn one_pole_cutoff_hz(alpha: u16, rate: u32) -> f32 {
    let pole = (ONE - alpha as u32).min(u16::MAX as u32) as u16;
    cutoff_from_alpha(pole, rate)
}

fn print_header(title: &str, freqs: &[f32]) {
    println!();
    print!("{:<24}", title);
    for f in freqs {
        if *f >= 1000.0 {
            print!("{:>7}", format!("{}k", f / 1000.0));
        } else {
            print!("{:>7}", *f as u32);
        }
    }
    println!();
}

fn print_row(label: &str, response: &Response, freqs: &[f32], rate: u32) {
    print!("{:<24}", label);
    for &f in freqs {
        print!("{:>7.1}", response.db_at(f, rate));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biquad_dc_gain_is_two() {
        let response = Response::biquad(52429);
        // Quantised b0 makes it a hair under 6.02 dB.
        assert!((response.db_at(1.0, 22050) - 6.02).abs() < 0.1);
        assert!(response.db_at(10_000.0, 22050) < -20.0);
    }

    #[test]
    fn test_air_shelf_matches_db_conversion() {
        for db in [1.0f32, 2.0, 3.0] {
            let gain = gain_q16_from_db(db);
            let response = Response::air_shelf(gain);
            assert!(response.db_at(1.0, 22050).abs() < 0.01);
            let expected = chime_dsp::shelf::db_from_gain_q16(gain);
            assert!((response.db_at(11_024.0, 22050) - expected).abs() < 0.05, "{} dB", db);
        }
    }

    #[test]
    fn test_dc_blocker_removes_dc() {
        assert!(Response::dc_blocker(HARD_ALPHA).db_at(0.5, 22050) < -10.0);
        assert!(Response::dc_blocker(SOFT_ALPHA).db_at(5000.0, 22050).abs() < 0.1);
    }

    #[test]
    fn test_darker_levels_have_lower_cutoffs() {
        let levels: Vec<_> = fixed_levels().collect();
        for pair in levels.windows(2) {
            let a = pair[0].biquad_alpha(0).unwrap_or(0);
            let b = pair[1].biquad_alpha(0).unwrap_or(0);
            assert!(cutoff_from_alpha(b, 22050) < cutoff_from_alpha(a, 22050));
            let a = pair[0].one_pole_alpha(0).unwrap_or(0);
            let b = pair[1].one_pole_alpha(0).unwrap_or(0);
            assert!(one_pole_cutoff_hz(b, 22050) < one_pole_cutoff_hz(a, 22050));
        }
    }

    #[test]
    fn test_rate_checked() {
        assert!(print(100).is_err());
    }
}
