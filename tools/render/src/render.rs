//! `render` subcommand.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::{debug, info};

use chime_engine::{
    AudioEngine, AudioError, AudioHardware, ChannelMode, Fade, FilterFlags, Loopback, LpfLevel,
    PlaybackState, SampleSource, FRAMES_PER_HALF,
};

/// Halves rendered past the expected length before giving up.
const SLACK_HALVES: usize = 64;

#[derive(Args)]
pub struct RenderArgs {
    /// Input file: WAV (mono or stereo PCM) or raw headerless PCM
    input: PathBuf,

    /// Output WAV file [default: <input>.chime.wav]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Playback rate (required for raw input)
    #[arg(long)]
    rate: Option<u32>,

    /// Sample depth: 8 (unsigned) or 16 (signed little-endian) [default: from the input]
    #[arg(long, value_parser = ["8", "16"])]
    bits: Option<String>,

    /// Raw input is interleaved stereo
    #[arg(long)]
    stereo: bool,

    /// Simulated volume knob, 0..=255
    #[arg(long, default_value_t = 255)]
    volume: u8,

    /// Use the power-law volume response
    #[arg(long)]
    nonlinear: bool,

    /// Exponent for the power-law volume response
    #[arg(long)]
    gamma: Option<f32>,

    /// 16-bit low-pass level
    #[arg(long, value_parser = crate::parse_level)]
    lpf16: Option<LpfLevel>,

    /// 16-bit low-pass cutoff in Hz (selects the custom level)
    #[arg(long)]
    cutoff: Option<f32>,

    /// 8-bit low-pass level
    #[arg(long, value_parser = crate::parse_level)]
    lpf8: Option<LpfLevel>,

    /// Use the biquad instead of the one-pole on the 8-bit path
    #[arg(long)]
    lpf8_biquad: bool,

    /// Air preset (0 = off)
    #[arg(long)]
    air_preset: Option<u8>,

    /// Enable the noise gate with this threshold
    #[arg(long)]
    gate: Option<u16>,

    /// Use the gentler DC blocker
    #[arg(long)]
    soft_dc: bool,

    /// Disable the soft clipper
    #[arg(long)]
    no_clip: bool,

    /// Disable 8-bit dither
    #[arg(long)]
    no_dither: bool,

    /// Fade-in seconds
    #[arg(long)]
    fade_in: Option<f32>,

    /// End fade-out seconds
    #[arg(long)]
    fade_out: Option<f32>,

    /// Pause fade seconds
    #[arg(long)]
    pause_fade: Option<f32>,

    /// Resume fade seconds
    #[arg(long)]
    resume_fade: Option<f32>,

    /// Pause once this many source samples have been decoded
    #[arg(long)]
    pause_at: Option<usize>,

    /// Halves of silence to hold a pause before resuming
    #[arg(long, default_value_t = 16)]
    pause_halves: usize,

    /// Request a stop once this many source samples have been decoded
    #[arg(long)]
    stop_at: Option<usize>,
}

/// Stand-in board: fixed volume knob, DMA "started" by the loopback driver.
struct HostBoard {
    volume: u8,
}

impl AudioHardware for HostBoard {
    fn set_amplifier(&mut self, enabled: bool) {
        debug!("amplifier {}", if enabled { "on" } else { "off" });
    }

    fn read_volume(&mut self) -> u8 {
        self.volume
    }

    fn reinit_audio_clock(&mut self, sample_rate: u32) {
        debug!("audio clock set to {} Hz", sample_rate);
    }

    fn start_dma(&mut self, buffer: &[i16]) -> Result<(), AudioError> {
        debug!("DMA started over {} slots", buffer.len());
        Ok(())
    }

    fn stop_dma(&mut self) {
        debug!("DMA stopped");
    }

    fn on_playback_end(&mut self) {
        debug!("end of sample");
    }

    fn on_fault(&mut self, error: AudioError) {
        log::error!("engine fault: {}", error);
    }
}

/// PCM loaded from disk, leaked so the engine can borrow it for `'static`.
struct LoadedPcm {
    source: SampleSource,
    len: usize,
    rate: u32,
    mode: ChannelMode,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let bits = args.bits.as_deref().map(|b| if b == "8" { 8 } else { 16 });
    let pcm = if is_wav(&args.input) {
        load_wav(&args.input, bits)?
    } else {
        let Some(rate) = args.rate else {
            bail!("raw input needs --rate");
        };
        load_raw(&args.input, bits.unwrap_or(16), args.stereo, rate)?
    };
    let rate = args.rate.unwrap_or(pcm.rate);
    info!(
        "loaded {:?}: {} samples, {}-bit {:?} at {} Hz",
        args.input,
        pcm.len,
        pcm.source.depth().bits(),
        pcm.mode,
        pcm.rate
    );

    let engine = AudioEngine::new();
    engine.init(HostBoard { volume: args.volume });
    engine
        .set_playback_rate(rate)
        .map_err(|e| anyhow::anyhow!("rate {} Hz: {}", rate, e))?;
    configure(&engine, &args)?;

    engine
        .play_sample(pcm.source, pcm.len, rate, pcm.mode)
        .map_err(|e| anyhow::anyhow!("play_sample failed: {}", e))?;

    let output = run(&engine, &args, &pcm)?;
    engine.wait_for_sample_end();

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| crate::default_output(&args.input));
    write_wav(&path, &output, rate)?;

    let stats = engine.stats();
    info!(
        "wrote {:?}: {} frames ({} decoded, {} samples consumed, {} refills)",
        path,
        output.len() / 2,
        stats.frames_decoded,
        stats.samples_consumed,
        stats.refills
    );
    Ok(())
}

fn configure(engine: &AudioEngine<HostBoard>, args: &RenderArgs) -> Result<()> {
    if let Some(level) = args.lpf16 {
        engine.set_lpf16_level(level);
    }
    if let Some(cutoff) = args.cutoff {
        if engine.set_lpf16_cutoff_hz(cutoff) == 0 {
            bail!("cutoff {} Hz is not below Nyquist", cutoff);
        }
    }
    if let Some(level) = args.lpf8 {
        engine.set_lpf8_level(level);
    }
    engine.set_filter_enabled(FilterFlags::LPF_8BIT_BIQUAD, args.lpf8_biquad);
    engine.set_filter_enabled(FilterFlags::SOFT_DC_FILTER, args.soft_dc);
    if args.no_clip {
        engine.set_filter_enabled(FilterFlags::SOFT_CLIPPING, false);
    }
    if args.no_dither {
        engine.set_filter_enabled(FilterFlags::DITHER_8BIT, false);
    }
    if let Some(threshold) = args.gate {
        engine.set_noise_gate_threshold(threshold);
        engine.set_filter_enabled(FilterFlags::NOISE_GATE, true);
    }
    if let Some(preset) = args.air_preset {
        if preset >= engine.air_preset_count() {
            bail!("air preset {} out of range", preset);
        }
        engine.set_air_preset(preset);
    }

    if let Some(gamma) = args.gamma {
        engine.set_volume_gamma(gamma);
    }
    engine.set_volume_response_nonlinear(args.nonlinear);

    for (fade, seconds) in [
        (Fade::In, args.fade_in),
        (Fade::Out, args.fade_out),
        (Fade::Pause, args.pause_fade),
        (Fade::Resume, args.resume_fade),
    ] {
        if let Some(seconds) = seconds {
            engine.set_fade_time(fade, seconds);
        }
    }

    let config = engine.config();
    info!(
        "filters: {:?}, lpf16 {} ({:.0} Hz), lpf8 {}, air preset {}",
        config.flags,
        config.lpf16_level.name(),
        engine.lpf16_cutoff_hz(),
        config.lpf8_level.name(),
        config.air_preset
    );
    Ok(())
}

/// Drive the loopback until the engine goes idle, firing the scripted
/// pause and stop requests along the way.
fn run(engine: &AudioEngine<HostBoard>, args: &RenderArgs, pcm: &LoadedPcm) -> Result<Vec<i16>> {
    let frames = pcm.len / pcm.mode.samples_per_frame() + 1;
    let max_halves = frames / FRAMES_PER_HALF + args.pause_halves + SLACK_HALVES;

    let mut loopback = Loopback::new(engine);
    let mut output = Vec::new();
    let mut paused = false;
    let mut stopped = false;
    let mut held = 0;

    for _ in 0..max_halves {
        let position = engine.position().unwrap_or(0);
        if !paused && args.pause_at.is_some_and(|at| position >= at) {
            engine.pause_playback();
            paused = true;
        }
        if !stopped && args.stop_at.is_some_and(|at| position >= at) {
            engine.stop_playback();
            stopped = true;
        }

        match engine.state() {
            PlaybackState::Idle => return Ok(output),
            PlaybackState::PlayingFailed => bail!("playback failed to start"),
            PlaybackState::Paused => {
                held += 1;
                if held > args.pause_halves {
                    engine.resume_playback();
                }
            }
            PlaybackState::Playing | PlaybackState::Pausing => {}
        }

        loopback.step(|half| output.extend_from_slice(half));
    }

    bail!("engine still {:?} after {} halves", engine.state(), max_halves)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

/// Headerless PCM, as it would be linked into flash.
fn load_raw(path: &Path, bits: u8, stereo: bool, rate: u32) -> Result<LoadedPcm> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let source = SampleSource::from_raw(Box::leak(bytes.into_boxed_slice()), bits)
        .map_err(|e| anyhow::anyhow!("{:?}: {}", path, e))?;
    if source.is_empty() {
        bail!("{:?} contains no samples", path);
    }
    let mode = if stereo { ChannelMode::Stereo } else { ChannelMode::Mono };
    Ok(LoadedPcm { source, len: source.len(), rate, mode })
}

fn load_wav(path: &Path, bits: Option<u8>) -> Result<LoadedPcm> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to load WAV: {:?}", path))?;
    let spec = reader.spec();

    let mode = match spec.channels {
        1 => ChannelMode::Mono,
        2 => ChannelMode::Stereo,
        n => bail!("Unsupported channel count: {}", n),
    };

    let wide: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int => match spec.bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| (v as i16) << 8))
                .collect::<Result<_, _>>()?,
            16 => reader.samples::<i16>().collect::<Result<_, _>>()?,
            24 | 32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> (spec.bits_per_sample - 16)) as i16))
                .collect::<Result<_, _>>()?,
            n => bail!("Unsupported bit depth: {}", n),
        },
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
            .collect::<Result<_, _>>()?,
    };
    if wide.is_empty() {
        bail!("{:?} contains no samples", path);
    }

    let narrow = bits.map_or(spec.bits_per_sample == 8, |b| b == 8);
    let len = wide.len();
    let source = if narrow {
        let data: Vec<u8> = wide.iter().map(|&s| ((s >> 8) + 128) as u8).collect();
        SampleSource::U8(Box::leak(data.into_boxed_slice()))
    } else {
        SampleSource::S16(Box::leak(wide.into_boxed_slice()))
    };

    Ok(LoadedPcm { source, len, rate: spec.sample_rate, mode })
}

fn write_wav(path: &Path, data: &[i16], rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create output: {:?}", path))?;
    for &sample in data {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
