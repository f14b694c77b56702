//! Write a synthetic capture file
//!
//! Produces an articulated "Arm" subject (Root → Upper → Lower) and a
//! "Wand" rigid body with three markers, suitable for replaying through
//! the daemon without a capture server.
//!
//! Usage:
//!   cargo run --bin capture-synth -- --output capture.bag --frames 600

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use mocap_retarget::Timestamped;
use mocap_retarget::core::types::now_us;
use mocap_retarget::io::bag::{BagRecorder, synth};

/// Synthetic capture generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output capture file
    #[arg(short, long, default_value = "capture.bag")]
    output: PathBuf,

    /// Number of frames to write
    #[arg(short, long, default_value = "600")]
    frames: u32,

    /// Capture rate in Hz
    #[arg(short, long, default_value = "100.0")]
    rate: f64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {} - {}", record.level(), record.target(), record.args()))
        .init();

    let args = Args::parse();
    if !(args.rate.is_finite() && args.rate > 0.0) {
        eprintln!("--rate must be positive");
        std::process::exit(1);
    }

    if let Err(e) = write_capture(&args) {
        log::error!("Failed to write {}: {}", args.output.display(), e);
        std::process::exit(1);
    }
}

fn write_capture(args: &Args) -> mocap_retarget::io::bag::Result<()> {
    let mut recorder = BagRecorder::create(&args.output)?;
    let start = now_us();
    let step_us = 1_000_000.0 / args.rate;

    for n in 0..args.frames {
        let timestamp = start + (n as f64 * step_us) as u64;
        recorder.record(&Timestamped::new(synth::demo_frame(n, args.rate), timestamp))?;
    }

    let info = recorder.finish()?;
    log::info!(
        "Wrote {} frames ({:.1}s) to {}",
        info.frame_count,
        info.duration_secs(),
        args.output.display()
    );
    Ok(())
}
