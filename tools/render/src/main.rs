//! chime-render: run PCM through the playback engine on the host.
//!
//! `render` plays a WAV file through the real engine code (filters, fades,
//! pause/stop handling) and writes the DMA output as a stereo 16-bit WAV.
//! `response` prints the cutoff each low-pass level lands on at a given rate.

mod render;
mod response;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use chime_engine::LpfLevel;

#[derive(Parser)]
#[command(name = "chime-render")]
#[command(about = "Render audio through the Chime playback engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a WAV file through the engine and capture the output
    Render(render::RenderArgs),

    /// Print low-pass cutoffs and air presets for a sample rate
    Response {
        /// Playback rate in Hz
        #[arg(long, default_value_t = 22050)]
        rate: u32,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render::execute(args),
        Commands::Response { rate } => response::print(rate),
    }
}

/// Parse an LPF level by its display name.
pub(crate) fn parse_level(s: &str) -> Result<LpfLevel, String> {
    LpfLevel::ALL
        .iter()
        .copied()
        .find(|level| level.name() == s)
        .ok_or_else(|| {
            let names: Vec<_> = LpfLevel::ALL.iter().map(|l| l.name()).collect();
            format!("unknown level '{}' (expected one of: {})", s, names.join(", "))
        })
}

/// Output path next to the input: `name.wav` becomes `name.chime.wav`.
pub(crate) fn default_output(input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    input.with_file_name(format!("{}.chime.wav", stem))
}
