//! Runtime filter configuration.
//!
//! [`FilterConfig`] is a plain `Copy` value. The engine keeps one instance and
//! replaces it whole; the completion handler always sees either the old or the
//! new configuration, never a mix. Every value passes through
//! [`FilterConfig::sanitized`] before it is stored, so no tunable can push the
//! per-sample arithmetic out of range.

use chime_dsp::q16::ONE;
use chime_dsp::{dynamics, shelf};

bitflags::bitflags! {
    /// Per-stage enable switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FilterFlags: u16 {
        /// Biquad low-pass on 16-bit sources
        const LPF_16BIT = 1 << 0;
        /// Use the soft (lower corner) DC blocker instead of the standard one
        const SOFT_DC_FILTER = 1 << 1;
        /// Low-pass on 8-bit sources
        const LPF_8BIT = 1 << 2;
        /// Attenuate very quiet samples
        const NOISE_GATE = 1 << 3;
        /// Cubic knee above the clip threshold
        const SOFT_CLIPPING = 1 << 4;
        /// High-shelf "air" boost
        const AIR_EFFECT = 1 << 5;
        /// TPDF dither when widening 8-bit samples
        const DITHER_8BIT = 1 << 6;
        /// 8-bit low-pass runs the biquad instead of the one-pole
        const LPF_8BIT_BIQUAD = 1 << 7;
    }
}

impl FilterFlags {
    /// Power-up defaults.
    pub const DEFAULT: Self = Self::LPF_16BIT
        .union(Self::SOFT_DC_FILTER)
        .union(Self::LPF_8BIT)
        .union(Self::SOFT_CLIPPING)
        .union(Self::DITHER_8BIT);
}

/// Low-pass aggressiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpfLevel {
    Off,
    VerySoft,
    Soft,
    Medium,
    Firm,
    Aggressive,
    /// Use the path's custom alpha
    Custom,
}

impl LpfLevel {
    /// All levels, in order of increasing filtering.
    pub const ALL: [LpfLevel; 7] = [
        LpfLevel::Off,
        LpfLevel::VerySoft,
        LpfLevel::Soft,
        LpfLevel::Medium,
        LpfLevel::Firm,
        LpfLevel::Aggressive,
        LpfLevel::Custom,
    ];

    /// Biquad alpha for this level (Q16, larger is darker).
    pub const fn biquad_alpha(self, custom: u16) -> Option<u16> {
        match self {
            LpfLevel::Off => None,
            LpfLevel::VerySoft => Some(40960),
            LpfLevel::Soft => Some(52429),
            LpfLevel::Medium => Some(57344),
            LpfLevel::Firm => Some(60416),
            LpfLevel::Aggressive => Some(63488),
            LpfLevel::Custom => Some(custom),
        }
    }

    /// One-pole alpha for this level (Q16, smaller is darker).
    pub const fn one_pole_alpha(self, custom: u16) -> Option<u16> {
        match self {
            LpfLevel::Off => None,
            LpfLevel::VerySoft => Some(61440),
            LpfLevel::Soft => Some(57344),
            LpfLevel::Medium => Some(49152),
            LpfLevel::Firm => Some(45056),
            LpfLevel::Aggressive => Some(40960),
            LpfLevel::Custom => Some(custom),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LpfLevel::Off => "off",
            LpfLevel::VerySoft => "very-soft",
            LpfLevel::Soft => "soft",
            LpfLevel::Medium => "medium",
            LpfLevel::Firm => "firm",
            LpfLevel::Aggressive => "aggressive",
            LpfLevel::Custom => "custom",
        }
    }
}

/// Default 16-bit makeup gain (unity).
pub const LPF16_MAKEUP_DEFAULT_Q16: u32 = ONE;

/// Default 8-bit makeup gain (about 1.08).
pub const LPF8_MAKEUP_DEFAULT_Q16: u32 = 70779;

/// Makeup gain bounds, 0.1 and 2.0 in Q16.
pub const MAKEUP_MIN_Q16: u32 = 6554;
pub const MAKEUP_MAX_Q16: u32 = 131072;

/// Noise gate threshold bounds.
pub const GATE_THRESHOLD_MIN: u16 = 1;
pub const GATE_THRESHOLD_MAX: u16 = 8192;

/// Number of air presets.
pub const AIR_PRESET_COUNT: u8 = shelf::PRESETS_DB.len() as u8;

/// Complete filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub flags: FilterFlags,
    pub lpf16_level: LpfLevel,
    /// Biquad alpha used when `lpf16_level` is `Custom`
    pub lpf16_custom_alpha: u16,
    pub lpf16_makeup_gain_q16: u32,
    pub lpf8_level: LpfLevel,
    /// One-pole alpha used when `lpf8_level` is `Custom`
    pub lpf8_custom_alpha: u16,
    pub lpf8_makeup_gain_q16: u32,
    /// Air shelf gain G, Q16
    pub air_gain_q16: u32,
    /// Index into the air preset table; 0 is off
    pub air_preset: u8,
    pub gate_threshold: u16,
}

impl FilterConfig {
    pub const DEFAULT: Self = Self {
        flags: FilterFlags::DEFAULT,
        lpf16_level: LpfLevel::Soft,
        lpf16_custom_alpha: 52429,
        lpf16_makeup_gain_q16: LPF16_MAKEUP_DEFAULT_Q16,
        lpf8_level: LpfLevel::Soft,
        lpf8_custom_alpha: 57344,
        lpf8_makeup_gain_q16: LPF8_MAKEUP_DEFAULT_Q16,
        air_gain_q16: shelf::DEFAULT_GAIN_Q16,
        air_preset: 0,
        gate_threshold: dynamics::GATE_THRESHOLD,
    };

    /// Clamp every tunable into its safe range.
    pub fn sanitized(mut self) -> Self {
        self.lpf16_makeup_gain_q16 =
            sanitize_makeup(self.lpf16_makeup_gain_q16, LPF16_MAKEUP_DEFAULT_Q16);
        self.lpf8_makeup_gain_q16 =
            sanitize_makeup(self.lpf8_makeup_gain_q16, LPF8_MAKEUP_DEFAULT_Q16);
        self.air_gain_q16 = self.air_gain_q16.min(shelf::MAX_GAIN_Q16);
        if self.air_preset >= AIR_PRESET_COUNT {
            self.air_preset = 0;
        }
        self.gate_threshold = self.gate_threshold.clamp(GATE_THRESHOLD_MIN, GATE_THRESHOLD_MAX);

        if self.lpf16_level == LpfLevel::Off {
            self.flags.remove(FilterFlags::LPF_16BIT);
        }
        if self.lpf8_level == LpfLevel::Off {
            self.flags.remove(FilterFlags::LPF_8BIT);
        }
        self
    }

    /// Select a 16-bit low-pass level; `Off` also clears the enable flag.
    pub fn set_lpf16_level(&mut self, level: LpfLevel) {
        self.lpf16_level = level;
        self.flags.set(FilterFlags::LPF_16BIT, level != LpfLevel::Off);
    }

    /// Select an 8-bit low-pass level; `Off` also clears the enable flag.
    pub fn set_lpf8_level(&mut self, level: LpfLevel) {
        self.lpf8_level = level;
        self.flags.set(FilterFlags::LPF_8BIT, level != LpfLevel::Off);
    }

    /// Biquad alpha currently in effect on the 16-bit path, if enabled.
    pub const fn lpf16_alpha(&self) -> Option<u16> {
        if !self.flags.contains(FilterFlags::LPF_16BIT) {
            return None;
        }
        self.lpf16_level.biquad_alpha(self.lpf16_custom_alpha)
    }

    /// Alpha currently in effect on the 8-bit path, if enabled.
    ///
    /// The meaning depends on [`FilterFlags::LPF_8BIT_BIQUAD`]: biquad levels
    /// are taken from the 16-bit table.
    pub const fn lpf8_alpha(&self) -> Option<u16> {
        if !self.flags.contains(FilterFlags::LPF_8BIT) {
            return None;
        }
        if self.flags.contains(FilterFlags::LPF_8BIT_BIQUAD) {
            self.lpf8_level.biquad_alpha(self.lpf8_custom_alpha)
        } else {
            self.lpf8_level.one_pole_alpha(self.lpf8_custom_alpha)
        }
    }

    /// Apply an air preset: index 0 disables the shelf, others enable it at
    /// the preset's boost. Out-of-range indices wrap.
    pub fn apply_air_preset(&mut self, index: u8) {
        let index = index % AIR_PRESET_COUNT;
        self.air_preset = index;
        if index == 0 {
            self.flags.remove(FilterFlags::AIR_EFFECT);
        } else {
            self.air_gain_q16 = shelf::gain_q16_from_db(shelf::PRESETS_DB[index as usize]);
            self.flags.insert(FilterFlags::AIR_EFFECT);
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn sanitize_makeup(gain: u32, default: u32) -> u32 {
    if gain == 0 {
        default
    } else {
        gain.clamp(MAKEUP_MIN_Q16, MAKEUP_MAX_Q16)
    }
}

/// Convert a float makeup gain to Q16, clamped to 0.1..=2.0.
pub fn makeup_gain_q16(gain: f32) -> u32 {
    if gain.is_nan() {
        return MAKEUP_MIN_Q16;
    }
    chime_dsp::q16::from_f32(gain.clamp(0.1, 2.0)).clamp(MAKEUP_MIN_Q16, MAKEUP_MAX_Q16)
}
