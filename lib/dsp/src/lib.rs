//! # Chime DSP Primitives
//!
//! Fixed-point building blocks for the Chime playback engine. Everything on
//! the per-sample path is integer-only so it can run inside a DMA completion
//! interrupt on a Cortex-M0+ class part without an FPU.
//!
//! ## Primitives
//!
//! - **Dither**: TPDF dither for widening unsigned 8-bit PCM to 16 bits
//! - **Biquad**: second-order low-pass derived from a single smoothing alpha
//! - **One-pole**: cheap first-order low-pass with makeup gain
//! - **DC blocker**: first-order high-pass, hard and soft variants
//! - **Air shelf**: one-pole high-shelf boost
//! - **Dynamics**: noise gate and smoothstep soft clipper
//! - **Envelope**: squared fade curves
//! - **Volume**: linear or power-law volume lookup table
//!
//! ## Number Formats
//!
//! Samples are `i16`. Gains and filter coefficients are Q16 (`65536 == 1.0`)
//! unless a constant says otherwise. Intermediate products are computed in
//! `i64` and every stage saturates back into the `i16` range.
//!
//! Floating point only appears in the configuration-translation helpers
//! ([`lowpass::alpha_from_cutoff`], [`shelf::gain_q16_from_db`],
//! [`envelope::seconds_to_samples`], [`volume::VolumeCurve::perceptual`]),
//! which go through `libm` so the crate stays `no_std`.

#![cfg_attr(not(test), no_std)]

pub mod biquad;
pub mod dc_block;
pub mod dither;
pub mod dynamics;
pub mod envelope;
pub mod lowpass;
pub mod one_pole;
pub mod q16;
pub mod shelf;
pub mod volume;

pub use biquad::{BiquadCoeffs, BiquadState};
pub use dc_block::DcBlocker;
pub use dither::Dither;
pub use one_pole::OnePole;
pub use shelf::AirShelf;
pub use volume::VolumeCurve;
