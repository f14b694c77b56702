//! Mocap retarget daemon
//!
//! Replays a capture file through the stream session and drives a local
//! hierarchy from it at the configured update rate.
//!
//! ```text
//! ┌──────────────┐   frames   ┌───────────────┐   tick   ┌─────────────┐
//! │ capture file │ ─────────► │ StreamSession │ ───────► │  Hierarchy  │
//! │ (simulated)  │            │  + Acquirer   │ LiveRig  │ (scene)     │
//! └──────────────┘            └───────────────┘          └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Generate a demo capture, then replay it
//! cargo run --release --bin capture-synth -- --output capture.bag
//! cargo run --release -- --config mocap-retarget.toml
//!
//! # Override the capture and force retimed acquisition
//! cargo run --release -- --capture take_03.bag --retimed
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use mocap_retarget::config::{Config, SubjectTarget};
use mocap_retarget::io::bag::SimulatedClient;
use mocap_retarget::{
    Hierarchy, LiveRig, NodeId, RetargetOptions, RetargetReport, SessionOptions, StreamSession,
    mirror_subject,
};

const DEFAULT_CONFIG: &str = "mocap-retarget.toml";

// ============================================================================
// Arguments
// ============================================================================

/// Stream a motion capture onto a local hierarchy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Capture file to replay (overrides replay.capture)
    #[arg(long)]
    capture: Option<PathBuf>,

    /// Force retimed acquisition
    #[arg(long)]
    retimed: bool,

    /// Seconds between status reports
    #[arg(long, default_value = "5")]
    status_interval: u64,
}

fn load_config(path: Option<&Path>) -> Config {
    let candidates: Vec<&Path> = match path {
        Some(p) => vec![p],
        None => vec![Path::new(DEFAULT_CONFIG)],
    };

    for p in candidates {
        if p.exists() {
            match Config::from_file(p) {
                Ok(config) => {
                    log::info!("Loaded config from {}", p.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to load config {}: {}", p.display(), e);
                }
            }
        } else if path.is_some() {
            log::warn!("Config file {} not found", p.display());
        }
    }

    log::info!("Using default configuration");
    Config::default()
}

// ============================================================================
// Scene setup
// ============================================================================

/// Subject roots that still need a mirrored skeleton.
struct PendingMirror {
    subject: String,
    root: NodeId,
}

/// Find or create the local node for each target.
fn resolve_targets(
    scene: &mut Hierarchy,
    targets: &[SubjectTarget],
) -> (Vec<(String, NodeId)>, Vec<PendingMirror>) {
    let mut resolved = Vec::with_capacity(targets.len());
    let mut pending = Vec::new();
    for target in targets {
        let node = match scene.find(&target.root_node) {
            Some(node) => node,
            None => {
                let node = scene.add_root(&target.root_node);
                pending.push(PendingMirror {
                    subject: target.subject.clone(),
                    root: node,
                });
                node
            }
        };
        resolved.push((target.subject.clone(), node));
    }
    (resolved, pending)
}

fn log_status(
    report: &RetargetReport,
    session: &StreamSession<SimulatedClient>,
    frames_ok: u64,
    frames_failed: u64,
) {
    log::info!(
        "frame={} nodes={} rot={}/{} pos={}/{} missed={} pump={}/{}",
        session.frame_number().value,
        report.nodes,
        report.rotations_applied,
        report.rotations_cached,
        report.positions_applied,
        report.positions_cached,
        report.rotations_missed + report.positions_missed,
        frames_ok,
        frames_failed
    );
    for subject in session.subject_names() {
        let markers = session.marker_samples(&subject);
        if !markers.is_empty() {
            log::debug!("{}: {} markers", subject, markers.len());
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn run(config: Config, running: Arc<AtomicBool>, status_interval: Duration) -> mocap_retarget::Result<()> {
    let client = SimulatedClient::from_bag(&config.replay.capture)?
        .looping(config.replay.loop_playback);
    let session = Arc::new(StreamSession::new(client, SessionOptions::from_config(&config)));

    let mut scene = Hierarchy::new();
    let (subjects, mut pending) = resolve_targets(&mut scene, &config.retarget.subjects);
    let (rigid_bodies, _) = resolve_targets(&mut scene, &config.retarget.rigid_bodies);

    let period = Duration::from_secs_f64(1.0 / config.replay.update_rate_hz);
    let mut rig = LiveRig::new(
        Arc::clone(&session),
        RetargetOptions::from_config(&config.retarget),
        period,
    );
    for (subject, root) in &subjects {
        rig.add_subject(subject, Some(*root));
    }
    for (subject, node) in &rigid_bodies {
        rig.add_rigid_body(subject, Some(*node));
    }
    log::info!(
        "Driving {} subjects and {} rigid bodies at {:.0} Hz ({:?})",
        subjects.len(),
        rigid_bodies.len(),
        config.replay.update_rate_hz,
        session.mode()
    );

    rig.start()?;

    let mut last_status = Instant::now();
    let mut window = RetargetReport::default();
    while running.load(Ordering::Relaxed) {
        let tick_start = Instant::now();

        if !pending.is_empty() && session.is_connected() {
            let before = pending.len();
            pending.retain(|p| {
                mirror_subject(session.as_ref(), &p.subject, &mut scene, p.root, &p.subject).is_none()
            });
            if pending.len() != before {
                log::info!("Mirrored {} subject skeletons", before - pending.len());
                rig.invalidate_mappings();
            }
        }

        let outcome = rig.tick(&mut scene);
        for e in &outcome.errors {
            log::warn!("{}", e);
        }
        window.merge(&outcome.report);

        if last_status.elapsed() >= status_interval {
            let (ok, failed) = rig
                .acquirer()
                .map(|a| (a.stats().frames_ok(), a.stats().frames_failed()))
                .unwrap_or((0, 0));
            if outcome.connected {
                log_status(&window, &session, ok, failed);
            } else {
                log::info!("Waiting for connection ({} attempts)", session.connect_attempts());
            }
            window = RetargetReport::default();
            last_status = Instant::now();
        }

        if let Some(remaining) = period.checked_sub(tick_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    rig.shutdown();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    log::info!("Mocap retarget starting...");

    let mut config = load_config(args.config.as_deref());
    if let Some(capture) = args.capture {
        config.replay.capture = capture;
    }
    if args.retimed {
        config.stream.retimed = true;
    }
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        std::process::exit(1);
    }

    // Ctrl-C ends the tick loop, then the rig shuts down
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        log::error!("Error setting Ctrl-C handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config, running, Duration::from_secs(args.status_interval)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
    log::info!("Mocap retarget stopped");
}
